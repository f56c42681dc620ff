//! Ledger records and wrappers.

use super::PlutusData;
use crate::codec::{CborDecode, CborEncode};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CborError, Result};
use crate::primitives::{Bytes, Embedded, EncodedValue, Rational};
use crate::{cbor_constr, cbor_list, cbor_map, cbor_newtype, cbor_union};
use std::io::Write;

cbor_newtype! {
    /// An amount of ADA in lovelace.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct Lovelace(pub u64);
}

cbor_list! {
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct TransactionInput {
        pub transaction_id: Bytes,
        pub index: u64,
    }
}

cbor_list! {
    /// Execution budget of a script.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExUnits {
        pub mem: u64,
        pub steps: u64,
    }
}

cbor_list! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExUnitPrices {
        pub mem_price: Rational,
        pub step_price: Rational,
    }
}

cbor_map! {
    [keys = int]
    /// A protocol parameter update; only the parameters being changed are present.
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct ProtocolParamUpdate {
        pub min_fee_a: Option<u64> = 0,
        pub min_fee_b: Option<u64> = 1,
        pub max_block_body_size: Option<u64> = 2,
        pub max_transaction_size: Option<u64> = 3,
        pub max_block_header_size: Option<u64> = 4,
        pub key_deposit: Option<Lovelace> = 5,
        pub pool_deposit: Option<Lovelace> = 6,
        pub maximum_epoch: Option<u64> = 7,
        pub desired_number_of_stake_pools: Option<u64> = 8,
        pub pool_pledge_influence: Option<Rational> = 9,
        pub expansion_rate: Option<Rational> = 10,
        pub treasury_growth_rate: Option<Rational> = 11,
        pub min_pool_cost: Option<Lovelace> = 16,
        pub ada_per_utxo_byte: Option<Lovelace> = 17,
        pub execution_costs: Option<ExUnitPrices> = 19,
        pub max_tx_ex_units: Option<ExUnits> = 20,
        pub max_block_ex_units: Option<ExUnits> = 21,
        pub max_value_size: Option<u64> = 22,
        pub collateral_percentage: Option<u64> = 23,
        pub max_collateral_inputs: Option<u64> = 24,
    }
}

/// Datum attached to an output: `[0, hash]` or `[1, tag(24) bytes(data)]`.
#[derive(Debug, Clone, PartialEq)]
pub enum DatumOption {
    Hash(Bytes),
    Inline(Embedded<PlutusData>),
}

impl CborEncode for DatumOption {
    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> Result<()> {
        e.write_array_header(Some(2))?;
        match self {
            DatumOption::Hash(hash) => {
                e.write_u64(0)?;
                hash.encode(e)
            }
            DatumOption::Inline(data) => {
                e.write_u64(1)?;
                data.encode(e)
            }
        }
    }
}

impl CborDecode for DatumOption {
    fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        let offset = d.position();
        if d.read_array_len()? != Some(2) {
            return Err(CborError::malformed("DatumOption", offset));
        }
        let kind_offset = d.position();
        match d.read_u64()? {
            0 => Bytes::decode(d).map(DatumOption::Hash),
            1 => Embedded::decode(d).map(DatumOption::Inline),
            _ => Err(CborError::malformed("DatumOption", kind_offset)),
        }
    }
}

cbor_map! {
    [keys = int]
    /// A post-Alonzo transaction output.
    #[derive(Debug, Clone, PartialEq)]
    pub struct TransactionOutput {
        pub address: Bytes = 0,
        pub amount: Lovelace = 1,
        pub datum: Option<DatumOption> = 2,
        /// Script reference, kept encoded.
        pub script_ref: Option<Embedded<EncodedValue>> = 3,
    }
}

cbor_constr! {
    [index = 0]
    #[derive(Debug, Clone, PartialEq)]
    pub struct PlutusSome<T> {
        pub value: T,
    }
}

cbor_constr! {
    [index = 1]
    #[derive(Debug, Clone, PartialEq)]
    pub struct PlutusNone {}
}

cbor_union! {
    /// Plutus `Maybe`: `Some` is constructor 0, `None` is constructor 1.
    #[derive(Debug, Clone, PartialEq)]
    pub enum PlutusOption<T> {
        Some(PlutusSome<T>),
        None(PlutusNone),
    }
}

impl<T> PlutusOption<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            PlutusOption::Some(some) => Some(some.value),
            PlutusOption::None(_) => None,
        }
    }
}

impl<T> From<Option<T>> for PlutusOption<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => PlutusOption::Some(PlutusSome { value }),
            None => PlutusOption::None(PlutusNone {}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_slice, to_vec};
    use hex_literal::hex;

    #[test]
    fn test_lovelace_is_transparent() {
        assert_eq!(to_vec(&Lovelace(1_000_000)).unwrap(), hex!("1a000f4240"));
        assert_eq!(
            from_slice::<Lovelace>(&hex!("1a000f4240")).unwrap(),
            Lovelace(1_000_000)
        );
    }

    #[test]
    fn test_transaction_input() {
        let input = TransactionInput {
            transaction_id: Bytes(vec![0xab; 32]),
            index: 1,
        };
        let bytes = to_vec(&input).unwrap();
        assert_eq!(&bytes[..3], hex!("82 5820"));
        assert_eq!(bytes.len(), 3 + 32 + 1);
        assert_eq!(from_slice::<TransactionInput>(&bytes).unwrap(), input);
    }

    #[test]
    fn test_ex_unit_prices() {
        let prices = ExUnitPrices {
            mem_price: Rational::new(577, 10000),
            step_price: Rational::new(721, 10000000),
        };
        let bytes = to_vec(&prices).unwrap();
        assert_eq!(
            bytes,
            hex!("82 d81e 82 190241 192710 d81e 82 1902d1 1a00989680")
        );
        assert_eq!(from_slice::<ExUnitPrices>(&bytes).unwrap(), prices);
    }

    #[test]
    fn test_param_update_skips_absent_fields() {
        let update = ProtocolParamUpdate {
            min_fee_a: Some(44),
            max_tx_ex_units: Some(ExUnits {
                mem: 14_000_000,
                steps: 10_000_000_000,
            }),
            ..Default::default()
        };
        let bytes = to_vec(&update).unwrap();
        assert_eq!(
            bytes,
            hex!("a2 00 182c 14 82 1a00d59f80 1b00000002540be400")
        );
        assert_eq!(from_slice::<ProtocolParamUpdate>(&bytes).unwrap(), update);
    }

    #[test]
    fn test_output_with_inline_datum() {
        let output = TransactionOutput {
            address: Bytes(vec![0x61; 29]),
            amount: Lovelace(2_000_000),
            datum: Some(DatumOption::Inline(
                Embedded::new(&PlutusData::int(42)).unwrap(),
            )),
            script_ref: None,
        };
        let bytes = to_vec(&output).unwrap();
        let decoded: TransactionOutput = from_slice(&bytes).unwrap();
        assert_eq!(decoded, output);
        let Some(DatumOption::Inline(datum)) = decoded.datum else {
            panic!("expected an inline datum");
        };
        assert_eq!(datum.decode_inner().unwrap(), PlutusData::int(42));
    }

    #[test]
    fn test_plutus_option() {
        let some = PlutusOption::from(Some(PlutusData::int(5)));
        assert_eq!(to_vec(&some).unwrap(), hex!("d8798105"));
        let none = PlutusOption::<PlutusData>::from(None);
        assert_eq!(to_vec(&none).unwrap(), hex!("d87a80"));
        assert_eq!(
            from_slice::<PlutusOption<PlutusData>>(&hex!("d87a80")).unwrap(),
            none
        );
        assert_eq!(
            from_slice::<PlutusOption<PlutusData>>(&hex!("d8798105")).unwrap(),
            some
        );
    }

    #[test]
    fn test_plutus_option_instantiations() {
        let bytes = hex!("d8798105");
        let number: PlutusOption<u64> = from_slice(&bytes).unwrap();
        assert_eq!(number.into_option(), Some(5));
        let data: PlutusOption<PlutusData> = from_slice(&bytes).unwrap();
        assert_eq!(data.into_option(), Some(PlutusData::int(5)));

        // `u64` cannot read a text payload; `String` can.
        let text = hex!("d879816161");
        assert!(from_slice::<PlutusOption<u64>>(&text).is_err());
        let name: PlutusOption<String> = from_slice(&text).unwrap();
        assert_eq!(name.into_option().as_deref(), Some("a"));
        assert_eq!(to_vec(&PlutusOption::from(Some("a".to_string()))).unwrap(), text);

        let input = PlutusOption::from(Some(TransactionInput {
            transaction_id: Bytes(vec![0x01; 2]),
            index: 0,
        }));
        let bytes = to_vec(&input).unwrap();
        assert_eq!(bytes, hex!("d879 81 82 420101 00"));
        assert_eq!(from_slice::<PlutusOption<TransactionInput>>(&bytes).unwrap(), input);
    }
}
