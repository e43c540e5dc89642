/// Number of decimals to show for a price of this magnitude.
pub fn decimals_for(value: f64) -> usize {
    let value = value.abs();
    if value < 0.01 {
        8
    } else if value < 1.0 {
        6
    } else if value < 100.0 {
        4
    } else {
        2
    }
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(price) => format!("{:.*}", decimals_for(price), price),
        None => String::from("N/A"),
    }
}
