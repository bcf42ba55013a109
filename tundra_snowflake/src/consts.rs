pub const AUTH_HEADER: &str = "Authorization";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const ACCEPT_HEADER: &str = "Accept";
pub const SNOWFLAKE_AUTH_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
pub const USER_AGENT_HEADER: &str = "User-Agent";
