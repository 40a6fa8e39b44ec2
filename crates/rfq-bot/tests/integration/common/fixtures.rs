//! Order source payload builders.

pub const BTC_FEED: &str = "0x0000000000000000000000000000000000000b7c";
pub const ETH_FEED: &str = "0x0000000000000000000000000000000000000e7c";
pub const REFERRER: &str = "0x00000000000000000000000000000000000000ee";

/// Fields that vary between test orders.
#[derive(Debug, Clone)]
pub struct OrderSpec {
    pub maker: &'static str,
    pub feed: &'static str,
    pub is_call: bool,
    pub is_long: bool,
    pub strike: &'static str,
    pub expiry: u64,
    pub order_expiry: u64,
    pub price: &'static str,
    pub num_contracts: &'static str,
}

impl Default for OrderSpec {
    fn default() -> Self {
        Self {
            maker: "0x00000000000000000000000000000000000000aa",
            feed: BTC_FEED,
            is_call: true,
            is_long: false,
            strike: "10000000000000",
            expiry: 4_100_000_000,
            order_expiry: 4_000_000_000,
            price: "5000000",
            num_contracts: "1000000",
        }
    }
}

/// Signed order envelope as the source serves it.
///
/// Field spacing is deliberately irregular so byte-exact forwarding is visible.
pub fn signed_order(spec: &OrderSpec) -> String {
    format!(
        r#"{{"order":{{"maker": "{}","orderExpiryTimestamp":"{}","collateral":"0x00000000000000000000000000000000000000c1","isCall":{},"priceFeed":"{}","implementation":"0x00000000000000000000000000000000000000e1","isLong":{},"maxCollateralUsable":"1000000000","strikes":["{}"],"expiry":"{}","price":"{}","numContracts":"{}","extraOptionData":"0x"}},"signature":"0xsig","nonce":"7"}}"#,
        spec.maker,
        spec.order_expiry,
        spec.is_call,
        spec.feed,
        spec.is_long,
        spec.strike,
        spec.expiry,
        spec.price,
        spec.num_contracts
    )
}

/// Inner `order` object of [`signed_order`].
pub fn order_object(spec: &OrderSpec) -> String {
    let envelope = signed_order(spec);
    let start = envelope.find('{').unwrap() + 1 + r#""order":"#.len();
    let end = envelope.find(r#","signature""#).unwrap();
    envelope[start..end].to_string()
}

/// Full response body.
pub fn book_body(orders: &[OrderSpec]) -> String {
    let orders: Vec<String> = orders.iter().map(signed_order).collect();
    format!(
        r#"{{"data":{{"orders":[{}],"market_data":{{"BTC":100000.0,"ETH":3500.0}}}}}}"#,
        orders.join(",")
    )
}

/// Config TOML pointing at `url`.
pub fn config_toml(url: &str) -> String {
    format!(
        r#"
[order_source]
url = "{url}"
timeout_ms = 2000
referrer = "{REFERRER}"

[poller]
interval_ms = 3600000

[[feeds]]
asset = "BTC"
price_feed = "{BTC_FEED}"

[[feeds]]
asset = "ETH"
price_feed = "{ETH_FEED}"
"#
    )
}
