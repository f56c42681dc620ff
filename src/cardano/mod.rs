//! Cardano ledger and Plutus types built on the codec.

mod ledger;
mod list;
mod plutus;

pub use ledger::{
    DatumOption, ExUnitPrices, ExUnits, Lovelace, PlutusNone, PlutusOption, PlutusSome,
    ProtocolParamUpdate, TransactionInput, TransactionOutput,
};
pub use list::MaybeIndefList;
pub use plutus::{PlutusConstr, PlutusData, PlutusInt};
