mod bcb;
mod yahoo;

pub use bcb::CentralBankAdapter;
pub use yahoo::YahooAdapter;
