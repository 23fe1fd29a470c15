use crate::prelude::*;

/// Human-readable overview of a snapshot, one entry per output line.
pub struct Summary<'a> {
    serial: Serial,
    snapshot: &'a Snapshot,
}

impl<'a> Summary<'a> {
    pub fn new(serial: Serial, snapshot: &'a Snapshot) -> Self {
        Self { serial, snapshot }
    }

    fn value(&self, name: &str) -> String {
        match self.snapshot.value(name) {
            Some(value) => value.to_string(),
            None => "N/A".to_string(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("logger {} summary:", self.serial),
            "  Energy production:".to_string(),
            format!("    Today:      {} kWh", self.value("pv_generation_today")),
            format!("    Total:      {} kWh", self.value("pv_generation_total")),
            format!("    Runtime:    {} min today", self.value("generation_time_today")),
            "  PV strings:".to_string(),
            format!(
                "    PV1:        {} kW ({} V x {} A)",
                self.value("power_pv1"),
                self.value("voltage_pv1"),
                self.value("current_pv1")
            ),
            format!(
                "    PV2:        {} kW ({} V x {} A)",
                self.value("power_pv2"),
                self.value("voltage_pv2"),
                self.value("current_pv2")
            ),
            "  Grid:".to_string(),
            format!("    Output:     {} kW", self.value("active_power_output_total")),
            format!("    Voltage:    {} V", self.value("voltage_phase_r")),
            format!("    Frequency:  {} Hz", self.value("frequency_grid")),
            format!("    Load:       {} kW", self.value("active_power_load_sys")),
            "  System:".to_string(),
            format!("    State:      {}", self.value("sys_state")),
            format!("    Ambient:    {} °C", self.value("temperature_env1")),
            format!("    Heatsink:   {} °C", self.value("temperature_heatsink1")),
        ]
    }

    pub fn log(&self) {
        for line in self.lines() {
            info!("{}", line);
        }
    }
}
