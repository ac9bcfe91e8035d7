//! Hardcoded fact tables.
//!
//! Sample data only. Keys are already normalized (see [`super::normalize`]).

/// National animal of a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimalFact {
    pub animal: &'static str,
    pub scientific_name: &'static str,
}

/// Capital city and its population (display string, thousands separated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapitalFact {
    pub capital: &'static str,
    pub population: &'static str,
}

/// Currency of a country with its value against one US dollar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFact {
    pub currency: &'static str,
    pub symbol: &'static str,
    pub value_against_usd: &'static str,
}

const fn animal_fact(animal: &'static str, scientific_name: &'static str) -> AnimalFact {
    AnimalFact { animal, scientific_name }
}

const fn capital_fact(capital: &'static str, population: &'static str) -> CapitalFact {
    CapitalFact { capital, population }
}

const fn currency_fact(
    currency: &'static str,
    symbol: &'static str,
    value_against_usd: &'static str,
) -> CurrencyFact {
    CurrencyFact { currency, symbol, value_against_usd }
}

static ANIMALS: &[(&str, AnimalFact)] = &[
    ("usa", animal_fact("Bald Eagle", "Haliaeetus leucocephalus")),
    ("united states", animal_fact("Bald Eagle", "Haliaeetus leucocephalus")),
    ("uk", animal_fact("Lion", "Panthera leo")),
    ("united kingdom", animal_fact("Lion", "Panthera leo")),
    ("japan", animal_fact("Green Pheasant", "Phasianus versicolor")),
    ("india", animal_fact("Bengal Tiger", "Panthera tigris tigris")),
    ("germany", animal_fact("Federal Eagle", "Aquila chrysaetos")),
    ("france", animal_fact("Gallic Rooster", "Gallus gallus domesticus")),
    ("canada", animal_fact("North American Beaver", "Castor canadensis")),
    ("australia", animal_fact("Red Kangaroo", "Macropus rufus")),
    ("china", animal_fact("Giant Panda", "Ailuropoda melanoleuca")),
    ("brazil", animal_fact("Jaguar", "Panthera onca")),
    ("mexico", animal_fact("Golden Eagle", "Aquila chrysaetos")),
    ("south korea", animal_fact("Siberian Tiger", "Panthera tigris altaica")),
    ("russia", animal_fact("Eurasian Brown Bear", "Ursus arctos arctos")),
];

static CAPITALS: &[(&str, CapitalFact)] = &[
    ("usa", capital_fact("Washington, D.C.", "689,545")),
    ("united states", capital_fact("Washington, D.C.", "689,545")),
    ("uk", capital_fact("London", "8,982,000")),
    ("united kingdom", capital_fact("London", "8,982,000")),
    ("japan", capital_fact("Tokyo", "13,960,000")),
    ("india", capital_fact("New Delhi", "16,787,941")),
    ("germany", capital_fact("Berlin", "3,645,000")),
    ("france", capital_fact("Paris", "2,161,000")),
    ("canada", capital_fact("Ottawa", "1,017,449")),
    ("australia", capital_fact("Canberra", "453,558")),
    ("china", capital_fact("Beijing", "21,540,000")),
    ("brazil", capital_fact("Brasília", "3,039,444")),
    ("mexico", capital_fact("Mexico City", "9,209,944")),
    ("south korea", capital_fact("Seoul", "9,733,509")),
    ("russia", capital_fact("Moscow", "12,506,468")),
];

static CURRENCIES: &[(&str, CurrencyFact)] = &[
    ("usa", currency_fact("US Dollar", "USD", "1.00")),
    ("united states", currency_fact("US Dollar", "USD", "1.00")),
    ("uk", currency_fact("British Pound", "GBP", "0.79")),
    ("united kingdom", currency_fact("British Pound", "GBP", "0.79")),
    ("japan", currency_fact("Japanese Yen", "JPY", "149.50")),
    ("india", currency_fact("Indian Rupee", "INR", "83.12")),
    ("germany", currency_fact("Euro", "EUR", "0.92")),
    ("france", currency_fact("Euro", "EUR", "0.92")),
    ("canada", currency_fact("Canadian Dollar", "CAD", "1.36")),
    ("australia", currency_fact("Australian Dollar", "AUD", "1.54")),
    ("china", currency_fact("Chinese Yuan", "CNY", "7.14")),
    ("brazil", currency_fact("Brazilian Real", "BRL", "4.97")),
    ("mexico", currency_fact("Mexican Peso", "MXN", "17.15")),
    ("south korea", currency_fact("South Korean Won", "KRW", "1298.50")),
    ("russia", currency_fact("Russian Ruble", "RUB", "89.50")),
    // No INR conversion rate exists for these two.
    ("switzerland", currency_fact("Swiss Franc", "CHF", "0.88")),
    ("south africa", currency_fact("South African Rand", "ZAR", "18.60")),
];

/// INR per one unit of the keyed currency.
static INR_RATES: &[(&str, f64)] = &[
    ("USD", 83.12),
    ("GBP", 105.50),
    ("JPY", 0.56),
    ("INR", 1.00),
    ("EUR", 90.25),
    ("CAD", 61.20),
    ("AUD", 54.00),
    ("CNY", 11.65),
    ("BRL", 16.75),
    ("MXN", 4.85),
    ("KRW", 0.064),
    ("RUB", 0.93),
];

fn find<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table
        .iter()
        .find_map(|(k, v)| if *k == key { Some(*v) } else { None })
}

/// Look up the national animal for a normalized country key.
pub fn animal(key: &str) -> Option<AnimalFact> {
    find(ANIMALS, key)
}

/// Look up the capital for a normalized country key.
pub fn capital(key: &str) -> Option<CapitalFact> {
    find(CAPITALS, key)
}

/// Look up the currency for a normalized country key.
pub fn currency(key: &str) -> Option<CurrencyFact> {
    find(CURRENCIES, key)
}

/// Look up the INR rate for a currency symbol. Symbols are matched exactly.
pub fn inr_rate(symbol: &str) -> Option<f64> {
    find(INR_RATES, symbol)
}
