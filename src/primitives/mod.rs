mod b58;

pub use b58::ToBase58String;
