use std::borrow::Cow;
use std::net::Ipv6Addr;

/// SQLAlchemy-style driver suffix in `mysql+<driver>://`.
pub const MYSQL_DRIVER_SCHEME: &str = "pymysql";

const REDACTED: &str = "***";

/// Parts of a MySQL connection URL, borrowed from the settings.
///
/// Absent parts render as empty segments.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseUrl<'a> {
    pub driver: &'a str,
    pub user: Option<&'a str>,
    pub password: Option<&'a str>,
    pub host: Option<&'a str>,
    pub port: &'a str,
    pub db: Option<&'a str>,
}

impl DatabaseUrl<'_> {
    pub fn render(&self) -> String {
        self.format(self.password.map(urlencoding::encode))
    }

    /// Same as [`render`](Self::render) with the password masked.
    pub fn redacted(&self) -> String {
        self.format(self.password.map(|_| Cow::Borrowed(REDACTED)))
    }

    fn format(&self, password: Option<Cow<'_, str>>) -> String {
        format!(
            "mysql+{}://{}:{}@{}:{}/{}",
            self.driver,
            self.user.map(urlencoding::encode).unwrap_or_default(),
            password.unwrap_or_default(),
            self.host.map(encode_host).unwrap_or_default(),
            self.port,
            self.db.unwrap_or_default(),
        )
    }
}

fn encode_host(host: &str) -> Cow<'_, str> {
    // IPv6 literals keep their colons and are always bracketed.
    if host.starts_with('[') && host.ends_with(']') {
        Cow::Borrowed(host)
    } else if host.parse::<Ipv6Addr>().is_ok() {
        Cow::Owned(format!("[{host}]"))
    } else {
        urlencoding::encode(host)
    }
}
