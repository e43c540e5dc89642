use serde::{
    de::{IgnoredAny, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use std::fmt;

// Deserialise a optional str. For example value to deserialise is "69.69". This
// de will return Some(69.69) if exists. Coinbase sends empty strings for an empty
// side of the book, so an empty string is also treated as None.
pub fn de_str_optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref() {
        Some(s) if !s.is_empty() => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

// Deserialise the first element of an array as a f64 and skip the rest. Kraken
// sends best bid and ask as ["price", wholeLotVolume, "lotVolume"] where the
// element types are mixed.
pub fn de_first_str_as_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct FirstPriceVisitor;

    impl<'de> Visitor<'de> for FirstPriceVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non empty sequence starting with a price string")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let price: String = seq
                .next_element()?
                .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            price.parse::<f64>().map_err(serde::de::Error::custom)
        }
    }

    deserializer.deserialize_seq(FirstPriceVisitor)
}
