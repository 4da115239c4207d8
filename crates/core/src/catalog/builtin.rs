use crate::domain::stock::StockRecord;

pub(super) const ALIASES: &[(&str, &str)] = &[
    ("BRKB", "BRK.B"),
    ("BRK-B", "BRK.B"),
    ("BRK/B", "BRK.B"),
    ("BRK B", "BRK.B"),
    ("BERKSHIRE", "BRK.B"),
];

// (symbol, name, exchange, sector, price)
const STOCKS: &[(&str, &str, &str, &str, f64)] = &[
    ("AAPL", "Apple Inc.", "NASDAQ", "Technology", 182.52),
    ("NKE", "Nike, Inc.", "NYSE", "Consumer Discretionary", 98.45),
    ("PEP", "PepsiCo, Inc.", "NASDAQ", "Consumer Staples", 171.48),
    ("MSFT", "Microsoft Corporation", "NASDAQ", "Technology", 378.85),
    ("GOOGL", "Alphabet Inc.", "NASDAQ", "Communication Services", 138.21),
    ("NVDA", "NVIDIA Corporation", "NASDAQ", "Technology", 495.22),
    ("TSLA", "Tesla, Inc.", "NASDAQ", "Consumer Discretionary", 248.5),
    ("AMZN", "Amazon.com, Inc.", "NASDAQ", "Consumer Discretionary", 151.94),
    ("COIN", "Coinbase Global, Inc.", "NASDAQ", "Financials", 156.78),
    ("MU", "Micron Technology, Inc.", "NASDAQ", "Technology", 87.45),
    ("F", "Ford Motor Company", "NYSE", "Consumer Discretionary", 12.34),
    ("BRK.B", "Berkshire Hathaway Inc. Class B", "NYSE", "Financials", 362.1),
];

pub(super) fn records() -> Vec<StockRecord> {
    STOCKS
        .iter()
        .map(|&(symbol, name, exchange, sector, price)| StockRecord {
            id: format!("stk_{}", symbol.to_lowercase().replace('.', "_")),
            symbol: symbol.to_string(),
            name: name.to_string(),
            exchange: exchange.to_string(),
            sector: sector.to_string(),
            price,
        })
        .collect()
}
