//! AWS resource tag constants for ec2-gateway
//!
//! Every resource the gateway creates is tagged so operators can tell
//! gateway-managed resources apart from hand-made ones.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `ec2-gateway:managed-by` | Static identifier ("ec2-gateway") |
//! | `ec2-gateway:created-at` | RFC 3339 creation timestamp |
//! | `Name` | Caller-chosen name, when there is one |

/// Tag key marking gateway-managed resources
pub const TAG_MANAGED_BY: &str = "ec2-gateway:managed-by";

/// Tag value for [`TAG_MANAGED_BY`]
pub const TAG_MANAGED_BY_VALUE: &str = "ec2-gateway";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "ec2-gateway:created-at";

/// Standard EC2 name tag
pub const TAG_NAME: &str = "Name";
