//! Unit conversion shortcut.
//!
//! `UnitConverter` covers a handful of everyday units so that queries like
//! `5 km` or `100 F to C` can be answered without a network round trip.

/// Maps a query to equivalent values in other units. An empty result means
/// no conversion applies.
pub trait ConversionResolver: Send + Sync {
    fn resolve(&self, input: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Length,
    Mass,
    Volume,
    Temperature,
}

/// A unit expressed relative to its dimension's base unit:
/// `base = value * factor + offset`.
#[derive(Debug)]
struct Unit {
    symbol: &'static str,
    aliases: &'static [&'static str],
    dimension: Dimension,
    factor: f64,
    offset: f64,
}

impl Unit {
    fn matches(&self, name: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    fn to_base(&self, value: f64) -> f64 {
        value * self.factor + self.offset
    }

    fn from_base(&self, base: f64) -> f64 {
        (base - self.offset) / self.factor
    }
}

const fn linear(
    symbol: &'static str,
    aliases: &'static [&'static str],
    dimension: Dimension,
    factor: f64,
) -> Unit {
    Unit {
        symbol,
        aliases,
        dimension,
        factor,
        offset: 0.0,
    }
}

static UNITS: &[Unit] = &[
    linear("m", &["meter", "meters", "metre", "metres"], Dimension::Length, 1.0),
    linear("km", &["kilometer", "kilometers", "kilometre", "kilometres"], Dimension::Length, 1000.0),
    linear("cm", &["centimeter", "centimeters"], Dimension::Length, 0.01),
    linear("mm", &["millimeter", "millimeters"], Dimension::Length, 0.001),
    linear("mi", &["mile", "miles"], Dimension::Length, 1609.344),
    linear("yd", &["yard", "yards"], Dimension::Length, 0.9144),
    linear("ft", &["foot", "feet"], Dimension::Length, 0.3048),
    linear("in", &["inch", "inches"], Dimension::Length, 0.0254),
    linear("kg", &["kilogram", "kilograms", "kilo", "kilos"], Dimension::Mass, 1.0),
    linear("g", &["gram", "grams"], Dimension::Mass, 0.001),
    linear("lb", &["lbs", "pound", "pounds"], Dimension::Mass, 0.453_592_37),
    linear("oz", &["ounce", "ounces"], Dimension::Mass, 0.028_349_523_125),
    linear("L", &["liter", "liters", "litre", "litres"], Dimension::Volume, 1.0),
    linear("mL", &["milliliter", "milliliters", "millilitre", "millilitres"], Dimension::Volume, 0.001),
    linear("gal", &["gallon", "gallons"], Dimension::Volume, 3.785_411_784),
    linear("qt", &["quart", "quarts"], Dimension::Volume, 0.946_352_946),
    linear("cup", &["cups"], Dimension::Volume, 0.236_588_236_5),
    linear("fl oz", &["floz", "fluid ounce", "fluid ounces"], Dimension::Volume, 0.029_573_529_562_5),
    Unit {
        symbol: "C",
        aliases: &["°C", "celsius", "degC"],
        dimension: Dimension::Temperature,
        factor: 1.0,
        offset: 273.15,
    },
    Unit {
        symbol: "F",
        aliases: &["°F", "fahrenheit", "degF"],
        dimension: Dimension::Temperature,
        factor: 5.0 / 9.0,
        offset: 273.15 - 32.0 * 5.0 / 9.0,
    },
    linear("K", &["kelvin"], Dimension::Temperature, 1.0),
];

fn find_unit(name: &str) -> Option<&'static Unit> {
    UNITS.iter().find(|unit| unit.matches(name))
}

/// Resolver backed by the built-in unit table.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitConverter;

impl UnitConverter {
    pub fn new() -> Self {
        Self
    }
}

impl ConversionResolver for UnitConverter {
    fn resolve(&self, input: &str) -> Vec<String> {
        let Some((value, source, target)) = parse(input) else {
            return Vec::new();
        };

        let base = source.to_base(value);
        UNITS
            .iter()
            .filter(|unit| unit.dimension == source.dimension && unit.symbol != source.symbol)
            .filter(|unit| target.map_or(true, |t| t.symbol == unit.symbol))
            .map(|unit| format!("{} {}", format_value(unit.from_base(base)), unit.symbol))
            .collect()
    }
}

/// Parse `<number> <unit>` with an optional `to <unit>` / `in <unit>` tail.
fn parse(input: &str) -> Option<(f64, &'static Unit, Option<&'static Unit>)> {
    let input = input.trim();
    let split = input
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
        .unwrap_or(input.len());
    let (number, rest) = input.split_at(split);
    let value: f64 = number.parse().ok()?;

    let rest = rest.trim();
    let (source, target) = match split_target(rest) {
        Some((source, target)) => (source, Some(find_unit(target)?)),
        None => (rest, None),
    };
    let source = find_unit(source)?;

    if let Some(target) = target {
        if target.dimension != source.dimension {
            return None;
        }
    }

    Some((value, source, target))
}

fn split_target(rest: &str) -> Option<(&str, &str)> {
    [" to ", " in "].iter().find_map(|sep| {
        rest.find(sep)
            .map(|i| (rest[..i].trim(), rest[i + sep.len()..].trim()))
    })
}

fn format_value(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        let results = UnitConverter::new().resolve("5 km");
        assert!(results.contains(&"5000 m".to_string()));
        assert!(results.contains(&"3.1069 mi".to_string()));
        assert!(!results.iter().any(|r| r.ends_with(" km")));
    }

    #[test]
    fn test_temperature_conversions() {
        let results = UnitConverter::new().resolve("100 celsius");
        assert_eq!(results, vec!["212 F".to_string(), "373.15 K".to_string()]);
    }

    #[test]
    fn test_explicit_target() {
        let converter = UnitConverter::new();
        assert_eq!(converter.resolve("3.5 miles to km"), vec!["5.6327 km".to_string()]);
        assert_eq!(converter.resolve("2 cups in mL"), vec!["473.1765 mL".to_string()]);
        assert!(converter.resolve("5 km to kg").is_empty());
        assert!(converter.resolve("5 km to parsecs").is_empty());
    }

    #[test]
    fn test_unrecognized_input() {
        let converter = UnitConverter::new();
        assert!(converter.resolve("population of france").is_empty());
        assert!(converter.resolve("12").is_empty());
        assert!(converter.resolve("12 widgets").is_empty());
        assert!(converter.resolve("").is_empty());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(2.0), "2");
        assert_eq!(format_value(0.125), "0.125");
        assert_eq!(format_value(-0.00001), "0");
        assert_eq!(format_value(211.999_999_999_999_97), "212");
    }
}
