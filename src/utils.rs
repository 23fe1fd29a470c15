pub struct Utils;
impl Utils {
    /// Round `value` to `places` decimal places.
    pub fn round(value: f64, places: u32) -> f64 {
        let m = 10f64.powi(places as i32);
        (value * m).round() / m
    }
}
