use std::fmt::{Display, Formatter};

/// Logical record name; doubles as the file stem on the file backend.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    /// The durable published-trades record.
    PublishedTrades,

    /// TTL-cached forecast windows.
    ForecastCache,

    /// The automation-mode preference.
    Automation,
}

impl Key {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PublishedTrades => "published_trades",
            Self::ForecastCache => "forecast_cache",
            Self::Automation => "automation",
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
