//! IP to SI conversion factors used when materials are materialized.
//!
//! Builders work in the units a residential building description is written
//! in (inches, hr·ft²·°F/Btu, lbm/ft³). The simulation model stores SI.

/// Metres per inch.
pub const M_PER_IN: f64 = 0.0254;

/// W/(m·K) per Btu/(hr·ft·°F).
pub const W_PER_MK_PER_BTU_PER_HR_FT_F: f64 = 1.730_734_666;

/// kg/m³ per lbm/ft³.
pub const KG_PER_M3_PER_LBM_PER_FT3: f64 = 16.018_463;

/// J/(kg·K) per Btu/(lbm·°F).
pub const J_PER_KG_K_PER_BTU_PER_LBM_F: f64 = 4186.8;

/// m²·K/W per hr·ft²·°F/Btu.
pub const M2K_PER_W_PER_HR_FT2_F_PER_BTU: f64 = 0.176_110_2;

/// m² per ft².
pub const M2_PER_FT2: f64 = 0.092_903_04;

/// Metres per foot.
pub const M_PER_FT: f64 = 0.3048;

pub fn in_to_m(inches: f64) -> f64 {
    inches * M_PER_IN
}

pub fn ft_to_m(feet: f64) -> f64 {
    feet * M_PER_FT
}

pub fn ft2_to_m2(area: f64) -> f64 {
    area * M2_PER_FT2
}

/// Converts a conductivity in Btu·in/(hr·ft²·°F) to W/(m·K).
pub fn k_in_to_si(k_in: f64) -> f64 {
    k_in / 12.0 * W_PER_MK_PER_BTU_PER_HR_FT_F
}

/// Converts W/(m·K) back to Btu·in/(hr·ft²·°F).
pub fn k_si_to_k_in(k: f64) -> f64 {
    k / W_PER_MK_PER_BTU_PER_HR_FT_F * 12.0
}

pub fn density_to_si(rho: f64) -> f64 {
    rho * KG_PER_M3_PER_LBM_PER_FT3
}

pub fn specific_heat_to_si(cp: f64) -> f64 {
    cp * J_PER_KG_K_PER_BTU_PER_LBM_F
}

/// Converts an R-value in hr·ft²·°F/Btu to m²·K/W.
pub fn r_value_to_si(r: f64) -> f64 {
    r * M2K_PER_W_PER_HR_FT2_F_PER_BTU
}

/// Converts a U-factor in Btu/(hr·ft²·°F) to W/(m²·K).
pub fn u_factor_to_si(u: f64) -> f64 {
    u / M2K_PER_W_PER_HR_FT2_F_PER_BTU
}

/// Converts a U-factor in W/(m²·K) to Btu/(hr·ft²·°F).
pub fn u_factor_to_ip(u: f64) -> f64 {
    u * M2K_PER_W_PER_HR_FT2_F_PER_BTU
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn test_conductivity_round_trip() {
        let k_in = 0.8004;
        assert!((k_si_to_k_in(k_in_to_si(k_in)) - k_in).abs() < EPSILON);
    }

    #[test]
    fn test_r13_in_si() {
        // R-13 is roughly RSI-2.29
        assert!((r_value_to_si(13.0) - 2.289).abs() < 1e-3);
    }

    #[test]
    fn test_u_factor_conversions_are_inverse() {
        let u = 0.35;
        assert!((u_factor_to_ip(u_factor_to_si(u)) - u).abs() < EPSILON);
    }
}
