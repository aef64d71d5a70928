#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("No table with id {0:?}; run `pdftables list` to see the available ids")]
    UnknownTable(String),

    #[error("No tables found in {0}")]
    NoTables(String),
}
