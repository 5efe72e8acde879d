use std::{fmt, str::FromStr};

/// Sports the event list endpoint knows about, with the numeric ids it expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sport {
    Football,
    Tennis,
    Basketball,
    Hockey,
}

impl Sport {
    pub fn id(self) -> u32 {
        match self {
            Sport::Football => 1,
            Sport::Tennis => 2,
            Sport::Basketball => 3,
            Sport::Hockey => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Sport::Football => "football",
            Sport::Tennis => "tennis",
            Sport::Basketball => "basketball",
            Sport::Hockey => "hockey",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "football" | "soccer" => Ok(Sport::Football),
            "tennis" => Ok(Sport::Tennis),
            "basketball" => Ok(Sport::Basketball),
            "hockey" => Ok(Sport::Hockey),
            other => Err(anyhow::anyhow!("unknown sport: {}", other)),
        }
    }
}
