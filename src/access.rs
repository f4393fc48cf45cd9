//! Access Modes
//!
//! Each batch operation takes the access mode relevant to it. A mode a
//! manager does not support for a whole batch is reported per element
//! through the error callback, not as a call-level error.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! access_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable label used in diagnostics
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

access_enum! {
    /// Access for `management_policy` queries
    PolicyAccess {
        Read => "read",
        Write => "write",
        CreateRelated => "createRelated",
        Required => "required",
        ManagerDriven => "managerDriven",
    }
}

access_enum! {
    /// Access for `resolve`
    ResolveAccess {
        Read => "read",
        ManagerDriven => "managerDriven",
    }
}

access_enum! {
    /// Access for `entity_traits`
    EntityTraitsAccess {
        Read => "read",
        Write => "write",
    }
}

access_enum! {
    /// Access for `default_entity_reference`
    DefaultEntityAccess {
        Read => "read",
        Write => "write",
        CreateRelated => "createRelated",
    }
}

access_enum! {
    /// Access for relationship queries
    RelationsAccess {
        Read => "read",
        Write => "write",
        CreateRelated => "createRelated",
    }
}

access_enum! {
    /// Access for `preflight` and `register`
    PublishingAccess {
        Write => "write",
        CreateRelated => "createRelated",
    }
}
