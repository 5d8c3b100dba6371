use super::server::ServerEntry;

/// Figures shown on the dashboard cards and charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSummary {
    /// Servers in the listing, whether or not their details arrived yet
    pub total: usize,
    pub up: usize,
    pub down: usize,
    /// Addresses whose detail request failed
    pub unavailable: Vec<String>,
}

impl FleetSummary {
    pub fn new(total: usize, entries: &[ServerEntry]) -> Self {
        let up = entries.iter().filter(|e| e.is_up()).count();
        Self {
            total,
            up,
            down: entries.len() - up,
            unavailable: entries
                .iter()
                .filter(|e| e.is_unavailable())
                .map(|e| e.ip.clone())
                .collect(),
        }
    }

    /// Share of powered-on servers among those with a known state.
    pub fn uptime_percent(&self) -> f64 {
        let known = self.up + self.down;
        if known == 0 {
            0.0
        } else {
            self.up as f64 / known as f64 * 100.0
        }
    }
}
