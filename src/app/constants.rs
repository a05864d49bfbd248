/// Name given to an app initialized without an explicit name.
pub const DEFAULT_ENTRY_NAME: &str = "[DEFAULT]";
