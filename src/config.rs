//! Run configuration shared by the library and the CLI.

/// Literal delimiter strings the scanner looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub endpoint: String,
    pub object: String,
    pub definition: String,
    pub end: String,
}

impl Default for Markers {
    fn default() -> Self {
        Markers {
            endpoint: "---ATOZAPI---".to_string(),
            object: "---ATOZOBJ---".to_string(),
            definition: "---ATOZDEF---".to_string(),
            end: "---ATOZEND---".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub markers: Markers,
    /// Worker threads for per-file work. `None` lets rayon decide.
    pub jobs: Option<usize>,
}
