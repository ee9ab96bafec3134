//! EC2 tag specifications for gateway-created resources
//!
//! Tag keys live in `ec2_gateway_common::tags`; this module only builds the
//! SDK types.

use aws_sdk_ec2::types::{ResourceType, Tag, TagSpecification};
use ec2_gateway_common::tags::{TAG_CREATED_AT, TAG_MANAGED_BY, TAG_MANAGED_BY_VALUE, TAG_NAME};

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Helper to parse creation timestamp from tags
pub fn parse_created_at(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

/// Build an EC2 TagSpecification with the standard gateway tags and an
/// optional `Name` tag.
pub fn ec2_tag_spec(resource_type: ResourceType, name: Option<&str>) -> TagSpecification {
    let created_at = format_created_at(chrono::Utc::now());
    let mut builder = TagSpecification::builder()
        .resource_type(resource_type)
        .tags(
            Tag::builder()
                .key(TAG_MANAGED_BY)
                .value(TAG_MANAGED_BY_VALUE)
                .build(),
        )
        .tags(Tag::builder().key(TAG_CREATED_AT).value(&created_at).build());
    if let Some(name) = name {
        builder = builder.tags(Tag::builder().key(TAG_NAME).value(name).build());
    }
    builder.build()
}

/// Find the value of the `Name` tag in an EC2 tag list
pub fn name_tag(tags: &[Tag]) -> Option<String> {
    tags.iter()
        .find(|t| t.key() == Some(TAG_NAME))
        .and_then(|t| t.value())
        .map(str::to_string)
}
