use crate::lsw3::decoder::{FieldSpec, Scale, ValueType};
use crate::lsw3::frame::RegisterRange;
use crate::prelude::*;

use std::collections::HashSet;

use ValueType::*;

const ONE: Option<Scale> = Some(Scale::ONE);
const TENTH: Option<Scale> = Some(Scale::TENTH);
const HUNDREDTH: Option<Scale> = Some(Scale::HUNDREDTH);

/// A register range read in one exchange, plus the fields decoded from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegisterBlock {
    pub name: &'static str,
    pub range: RegisterRange,
    pub fields: &'static [FieldSpec],
}

impl RegisterBlock {
    pub fn validate(&self) -> Result<()> {
        self.range
            .count()
            .map_err(|e| anyhow!("block {}: {}", self.name, e))?;

        if self.fields.is_empty() {
            bail!("block {} has no fields", self.name);
        }

        for field in self.fields {
            let overhangs = field.last_register() > u32::from(self.range.end);
            if !self.range.contains(field.register) || overhangs {
                bail!(
                    "block {}: field {} ({} at {:#06x}) lies outside {}",
                    self.name,
                    field.name,
                    field.value_type,
                    field.register,
                    self.range
                );
            }
        }

        Ok(())
    }
}

// {{{ register table
pub const ENERGY_TOTALS: RegisterBlock = RegisterBlock {
    name: "energy_totals",
    range: RegisterRange::new(0x684, 0x69B),
    fields: &[
        FieldSpec::new("pv_generation_today", 0x684, U32, HUNDREDTH, "kWh"),
        FieldSpec::new("pv_generation_total", 0x686, U32, TENTH, "kWh"),
        FieldSpec::new("load_consumption_today", 0x688, U32, HUNDREDTH, "kWh"),
        FieldSpec::new("load_consumption_total", 0x68A, U32, TENTH, "kWh"),
        FieldSpec::new("energy_purchase_today", 0x68C, U32, HUNDREDTH, "kWh"),
        FieldSpec::new("energy_purchase_total", 0x68E, U32, TENTH, "kWh"),
        FieldSpec::new("energy_selling_today", 0x690, U32, HUNDREDTH, "kWh"),
        FieldSpec::new("energy_selling_total", 0x692, U32, TENTH, "kWh"),
    ],
};

pub const PV_OUTPUT: RegisterBlock = RegisterBlock {
    name: "pv_output",
    range: RegisterRange::new(0x584, 0x589),
    fields: &[
        FieldSpec::new("voltage_pv1", 0x584, U16, TENTH, "V"),
        FieldSpec::new("current_pv1", 0x585, U16, HUNDREDTH, "A"),
        FieldSpec::new("power_pv1", 0x586, U16, HUNDREDTH, "kW"),
        FieldSpec::new("voltage_pv2", 0x587, U16, TENTH, "V"),
        FieldSpec::new("current_pv2", 0x588, U16, HUNDREDTH, "A"),
        FieldSpec::new("power_pv2", 0x589, U16, HUNDREDTH, "kW"),
    ],
};

pub const GRID_OUTPUT: RegisterBlock = RegisterBlock {
    name: "grid_output",
    range: RegisterRange::new(0x484, 0x4AF),
    fields: &[
        FieldSpec::new("frequency_grid", 0x484, U16, HUNDREDTH, "Hz"),
        FieldSpec::new("active_power_output_total", 0x485, I16, HUNDREDTH, "kW"),
        FieldSpec::new("active_power_pcc_total", 0x488, I16, HUNDREDTH, "kW"),
        FieldSpec::new("voltage_phase_r", 0x48D, U16, TENTH, "V"),
        FieldSpec::new("current_output_r", 0x48E, U16, HUNDREDTH, "A"),
        FieldSpec::new("active_power_output_r", 0x48F, I16, HUNDREDTH, "kW"),
        FieldSpec::new("active_power_load_sys", 0x4AF, U16, HUNDREDTH, "kW"),
    ],
};

pub const SYSTEM_INFO: RegisterBlock = RegisterBlock {
    name: "system_info",
    range: RegisterRange::new(0x404, 0x431),
    fields: &[
        FieldSpec::new("sys_state", 0x404, U16, None, ""),
        FieldSpec::new("countdown", 0x417, U16, ONE, "s"),
        FieldSpec::new("temperature_env1", 0x418, I16, ONE, "°C"),
        FieldSpec::new("temperature_heatsink1", 0x41A, I16, ONE, "°C"),
        FieldSpec::new("generation_time_today", 0x426, U16, ONE, "min"),
        FieldSpec::new("generation_time_total", 0x427, U32, ONE, "min"),
        FieldSpec::new("insulation_resistance", 0x42B, U16, ONE, "kΩ"),
    ],
};

/// Blocks in the order a poll cycle reads them.
pub const REGISTER_TABLE: [RegisterBlock; 4] = [ENERGY_TOTALS, PV_OUTPUT, GRID_OUTPUT, SYSTEM_INFO];
// }}}

/// Validate every block and check field names are unique across the table.
pub fn validate_table(blocks: &[RegisterBlock]) -> Result<()> {
    if blocks.is_empty() {
        bail!("register table is empty");
    }

    let mut names = HashSet::new();
    for block in blocks {
        block.validate()?;
        for field in block.fields {
            if !names.insert(field.name) {
                bail!("field {} appears more than once in the register table", field.name);
            }
        }
    }

    Ok(())
}
