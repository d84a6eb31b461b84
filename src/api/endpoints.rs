//! Portal API endpoint paths

pub const TOKEN_REFRESH: &str = "/api/token/refresh/";
pub const CURRENT_USER: &str = "/api/users/me/";
pub const LOGOUT: &str = "/api/logout/";
pub const LOGIN: &str = "/api/login/";
pub const REGISTER_INIT: &str = "/api/register/init/";
pub const REGISTER_CONFIRM: &str = "/api/register/confirm/";

/// Join the API base URL and an endpoint path
pub fn url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        assert_eq!(
            url("https://portal.example.edu", TOKEN_REFRESH),
            "https://portal.example.edu/api/token/refresh/"
        );
        assert_eq!(
            url("https://portal.example.edu/", CURRENT_USER),
            "https://portal.example.edu/api/users/me/"
        );
    }
}
