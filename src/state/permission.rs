//! Permission nodes checked by combined commands.

/// A permission the game surface checks structurally and command bodies
/// check again before privileged branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Run `link` for yourself.
    Link,
    /// Link another player to another user.
    LinkOther,
    /// Run `linked` for yourself.
    Linked,
    /// Query the link status of someone else.
    LinkedOther,
}

impl Permission {
    pub fn node(&self) -> &'static str {
        match self {
            Self::Link => "linkbridge.command.link",
            Self::LinkOther => "linkbridge.command.link.other",
            Self::Linked => "linkbridge.command.linked",
            Self::LinkedOther => "linkbridge.command.linked.other",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.node())
    }
}
