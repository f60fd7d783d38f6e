use serde::Serialize;
use std::collections::HashMap;

/// A tradable instrument. The code doubles as the upstream provider
/// symbol for the polling quote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub code: String,
    pub name: String,
}

/// Directory of instruments the engine can quote and trade.
/// A code outside the catalog is an `UnknownInstrument` at order time.
#[derive(Debug, Clone)]
pub struct InstrumentCatalog {
    instruments: HashMap<String, Instrument>,
}

impl InstrumentCatalog {
    pub fn new(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        Self {
            instruments: instruments
                .into_iter()
                .map(|i| (i.code.clone(), i))
                .collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&Instrument> {
        self.instruments.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.instruments.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Codes in stable (sorted) order, for listings and logs.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.instruments.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for InstrumentCatalog {
    /// Built-in KRX large caps, the default universe of the simulator.
    fn default() -> Self {
        let listed = [
            ("005930", "Samsung Electronics"),
            ("000660", "SK hynix"),
            ("373220", "LG Energy Solution"),
            ("005380", "Hyundai Motor"),
            ("000270", "Kia"),
            ("035420", "NAVER"),
            ("035720", "Kakao"),
            ("005490", "POSCO Holdings"),
            ("051910", "LG Chem"),
            ("105560", "KB Financial Group"),
        ];
        Self::new(listed.into_iter().map(|(code, name)| Instrument {
            code: code.to_string(),
            name: name.to_string(),
        }))
    }
}
