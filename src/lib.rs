pub mod config {
    pub mod settings;
}
pub mod middleware {
    pub mod metrics;
    pub mod path_logger;
}
pub mod routes {
    pub mod health;
    pub mod radar;
}
pub mod services {
    pub mod market_data;
    pub mod notifier;
    pub mod radar;

    pub mod strategies {
        pub mod common;
        pub use common::{Candle, CandleInterval, Market};
        pub mod surge;
    }
}

pub mod utils {
    pub mod errors;
    pub mod route_debug;
    pub mod types;
}
