//! Declaration macros generating a type together with its schema and codec impls.
//!
//! Each macro takes an optional `[name = value, flag]` header whose entries are
//! applied to the type's [`TypeSpec`](crate::schema::TypeSpec): `tag = N`,
//! `index = N` (constructor index), `indefinite` and `nullable`. Map records start
//! their header with `keys = int` or `keys = text`.
//!
//! Records and unions may take type parameters (`struct Pair<A, B>`); the generated
//! impls require every parameter to implement both codec traits.

/// Declares an array record: fields are written in order as one CBOR array.
///
/// Fields may carry an explicit wire position (`field: Type = 2`); either all fields
/// do or none does. Absent nullable fields are left out of the array, so only
/// trailing fields should be nullable.
///
/// ```
/// use cardano_cbor::{cbor_list, from_slice, to_vec};
///
/// cbor_list! {
///     #[derive(Debug, PartialEq)]
///     pub struct Point {
///         pub x: u64,
///         pub y: u64,
///     }
/// }
///
/// let bytes = to_vec(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(bytes, [0x82, 0x01, 0x02]);
/// assert_eq!(from_slice::<Point>(&bytes).unwrap(), Point { x: 1, y: 2 });
/// ```
#[macro_export]
macro_rules! cbor_list {
    (
        $(#[$meta:meta])*
        $vis:vis struct $($rest:tt)*
    ) => {
        $crate::cbor_list! { [] $(#[$meta])* $vis struct $($rest)* }
    };
    (
        [$($opt:ident $(= $val:expr)?),* $(,)?]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(<$($g:ident),* $(,)?>)? {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty $(= $pos:literal)?
            ),* $(,)?
        }
    ) => {
        $crate::__cbor_record! {
            category = Array;
            options = [$($opt $(= $val)?),*];
            $(#[$meta])*
            $vis struct $name $(<$($g),*>)? {
                $( $(#[$fmeta])* $fvis $field : $fty $(= $pos)? ),*
            }
        }
    };
}

/// Declares a Plutus constructor: `tag(121 + index) [fields...]`.
///
/// The header must carry `index = N`; add `indefinite` for `0x9F ... 0xFF` framing.
///
/// ```
/// use cardano_cbor::{cbor_constr, to_vec};
///
/// cbor_constr! {
///     [index = 0]
///     pub struct Wrapped {
///         pub value: u64,
///     }
/// }
///
/// assert_eq!(to_vec(&Wrapped { value: 5 }).unwrap(), [0xd8, 0x79, 0x81, 0x05]);
/// ```
#[macro_export]
macro_rules! cbor_constr {
    (
        [$($opt:ident $(= $val:expr)?),* $(,)?]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(<$($g:ident),* $(,)?>)? {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty $(= $pos:literal)?
            ),* $(,)?
        }
    ) => {
        $crate::__cbor_record! {
            category = Constr;
            options = [$($opt $(= $val)?),*];
            $(#[$meta])*
            $vis struct $name $(<$($g),*>)? {
                $( $(#[$fmeta])* $fvis $field : $fty $(= $pos)? ),*
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __cbor_record {
    (
        category = $category:ident;
        options = [$($opt:ident $(= $val:expr)?),*];
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(<$($g:ident),* $(,)?>)? {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty $(= $pos:literal)? ),*
        }
    ) => {
        $(#[$meta])*
        $vis struct $name $(<$($g),*>)? {
            $( $(#[$fmeta])* $fvis $field : $fty ),*
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::registry::CborSchema for $name $(<$($g),*>)? {
            fn describe() -> $crate::schema::TypeSpec {
                $crate::schema::TypeSpec::new(
                    stringify!($name),
                    $crate::schema::Category::$category,
                )
                $(.$opt($($val)?))*
                $(
                    .field({
                        let field = $crate::schema::FieldSpec::new(
                            stringify!($field),
                            stringify!($fty),
                            <$fty as $crate::codec::CborDecode>::absent().is_some(),
                        );
                        $( let field = field.with_key($crate::schema::WireKey::Int($pos)); )?
                        field
                    })
                )*
            }
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::codec::CborEncode for $name $(<$($g),*>)? {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn encode<W: ::std::io::Write>(
                &self,
                e: &mut $crate::encoder::Encoder<W>,
            ) -> $crate::error::Result<()> {
                let spec = $crate::registry::spec::<Self>()?;
                let len = 0usize
                    $( + usize::from(!$crate::codec::CborEncode::is_absent(&self.$field)) )*;
                $crate::container::begin_record(e, &spec, len)?;
                for index in spec.wire_order() {
                    let mut declared = 0usize;
                    $(
                        if declared == index && !$crate::codec::CborEncode::is_absent(&self.$field) {
                            $crate::codec::CborEncode::encode(&self.$field, e)?;
                        }
                        declared += 1;
                    )*
                }
                $crate::container::end_record(e, &spec)
            }
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::codec::CborDecode for $name $(<$($g),*>)? {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn decode(d: &mut $crate::decoder::Decoder<'_>) -> $crate::error::Result<Self> {
                let spec = $crate::registry::spec::<Self>()?;
                let mut items = $crate::container::open_record(d, &spec)?;
                d.nested(|d| {
                    $( let mut $field: ::std::option::Option<$fty> = None; )*
                    for index in spec.wire_order() {
                        if !items.next(d)? {
                            break;
                        }
                        let mut declared = 0usize;
                        $(
                            if declared == index {
                                $field = Some(<$fty as $crate::codec::CborDecode>::decode(d)?);
                            }
                            declared += 1;
                        )*
                    }
                    items.finish(d)?;
                    Ok($name {
                        $( $field: $crate::container::required($field, spec.name, stringify!($field))?, )*
                    })
                })
            }

            fn leading_tag() -> ::std::option::Option<u64> {
                $crate::registry::spec::<Self>()
                    .ok()
                    .and_then(|spec| spec.leading_tag())
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wire_key {
    (int, $key:literal) => {
        $crate::schema::WireKey::Int($key)
    };
    (text, $key:literal) => {
        $crate::schema::WireKey::Text($key)
    };
}

/// Declares a map record: one `key => value` entry per field.
///
/// Absent fields are skipped, or written as `null` when the header says `nullable`.
/// Decoding rejects keys the record does not declare.
///
/// ```
/// use cardano_cbor::{cbor_map, from_slice, to_vec};
///
/// cbor_map! {
///     [keys = text]
///     #[derive(Debug, PartialEq)]
///     pub struct Named {
///         pub name: String = "name",
///         pub age: Option<u64> = "age",
///     }
/// }
///
/// let named = Named { name: "a".into(), age: None };
/// let bytes = to_vec(&named).unwrap();
/// assert_eq!(bytes, [0xa1, 0x64, b'n', b'a', b'm', b'e', 0x61, b'a']);
/// assert_eq!(from_slice::<Named>(&bytes).unwrap(), named);
/// ```
#[macro_export]
macro_rules! cbor_map {
    (
        [keys = $kind:ident $(, $opt:ident $(= $val:expr)?)* $(,)?]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(<$($g:ident),* $(,)?>)? {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty = $key:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name $(<$($g),*>)? {
            $( $(#[$fmeta])* $fvis $field : $fty ),*
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::registry::CborSchema for $name $(<$($g),*>)? {
            fn describe() -> $crate::schema::TypeSpec {
                $crate::schema::TypeSpec::new(stringify!($name), $crate::schema::Category::Map)
                $(.$opt($($val)?))*
                $(
                    .field(
                        $crate::schema::FieldSpec::new(
                            stringify!($field),
                            stringify!($fty),
                            <$fty as $crate::codec::CborDecode>::absent().is_some(),
                        )
                        .with_key($crate::__wire_key!($kind, $key)),
                    )
                )*
            }
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::codec::CborEncode for $name $(<$($g),*>)? {
            fn encode<W: ::std::io::Write>(
                &self,
                e: &mut $crate::encoder::Encoder<W>,
            ) -> $crate::error::Result<()> {
                let spec = $crate::registry::spec::<Self>()?;
                let writes_nulls = spec.writes_nulls();
                let len = 0usize
                    $( + usize::from(writes_nulls || !$crate::codec::CborEncode::is_absent(&self.$field)) )*;
                $crate::container::begin_record(e, &spec, len)?;
                $(
                    if writes_nulls || !$crate::codec::CborEncode::is_absent(&self.$field) {
                        $crate::codec::CborEncode::encode(&$crate::__wire_key!($kind, $key), e)?;
                        $crate::codec::CborEncode::encode(&self.$field, e)?;
                    }
                )*
                $crate::container::end_record(e, &spec)
            }
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::codec::CborDecode for $name $(<$($g),*>)? {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn decode(d: &mut $crate::decoder::Decoder<'_>) -> $crate::error::Result<Self> {
                let spec = $crate::registry::spec::<Self>()?;
                let mut items = $crate::container::open_record(d, &spec)?;
                d.nested(|d| {
                    $( let mut $field: ::std::option::Option<$fty> = None; )*
                    while items.next(d)? {
                        let key = $crate::container::MapKey::read(d)?;
                        let index = key.field_index(&spec)?;
                        let mut declared = 0usize;
                        $(
                            if declared == index {
                                if $field.is_some() {
                                    return Err($crate::error::CborError::DuplicateMapKey {
                                        type_name: spec.name,
                                        key: key.to_string(),
                                    });
                                }
                                $field = Some(<$fty as $crate::codec::CborDecode>::decode(d)?);
                            }
                            declared += 1;
                        )*
                    }
                    items.finish(d)?;
                    Ok($name {
                        $( $field: $crate::container::required($field, spec.name, stringify!($field))?, )*
                    })
                })
            }

            fn leading_tag() -> ::std::option::Option<u64> {
                $crate::registry::spec::<Self>()
                    .ok()
                    .and_then(|spec| spec.leading_tag())
            }
        }
    };
}

/// Declares a single-field wrapper encoded exactly as its field, after an optional tag.
///
/// ```
/// use cardano_cbor::{cbor_newtype, to_vec};
///
/// cbor_newtype! {
///     #[derive(Debug, Clone, Copy, PartialEq)]
///     pub struct Slot(pub u64);
/// }
///
/// assert_eq!(to_vec(&Slot(24)).unwrap(), [0x18, 0x18]);
/// ```
#[macro_export]
macro_rules! cbor_newtype {
    (
        $(#[$meta:meta])*
        $vis:vis struct $($rest:tt)*
    ) => {
        $crate::cbor_newtype! { [] $(#[$meta])* $vis struct $($rest)* }
    };
    (
        [$($opt:ident $(= $val:expr)?),* $(,)?]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($fvis:vis $inner:ty);
    ) => {
        $(#[$meta])*
        $vis struct $name($fvis $inner);

        impl $crate::registry::CborSchema for $name {
            fn describe() -> $crate::schema::TypeSpec {
                $crate::schema::TypeSpec::new(stringify!($name), $crate::schema::Category::Container)
                $(.$opt($($val)?))*
                .field($crate::schema::FieldSpec::new("0", stringify!($inner), false))
            }
        }

        impl $crate::codec::CborEncode for $name {
            fn encode<W: ::std::io::Write>(
                &self,
                e: &mut $crate::encoder::Encoder<W>,
            ) -> $crate::error::Result<()> {
                if let Some(tag) = $crate::registry::spec::<Self>()?.tag {
                    e.write_tag(tag)?;
                }
                $crate::codec::CborEncode::encode(&self.0, e)
            }
        }

        impl $crate::codec::CborDecode for $name {
            fn decode(d: &mut $crate::decoder::Decoder<'_>) -> $crate::error::Result<Self> {
                if let Some(tag) = $crate::registry::spec::<Self>()?.tag {
                    d.expect_tag(tag)?;
                }
                Ok($name(<$inner as $crate::codec::CborDecode>::decode(d)?))
            }

            fn leading_tag() -> ::std::option::Option<u64> {
                match $crate::registry::spec::<Self>() {
                    Ok(spec) if spec.tag.is_some() => spec.tag,
                    _ => <$inner as $crate::codec::CborDecode>::leading_tag(),
                }
            }
        }

        impl ::std::convert::From<$inner> for $name {
            fn from(inner: $inner) -> Self {
                $name(inner)
            }
        }
    };
}

/// Declares a union over single-field variants.
///
/// Encoding writes the active variant unchanged. Decoding resolves the variant by
/// its leading tag when every variant has a distinct one, and otherwise tries the
/// variants in declaration order, keeping the first that decodes.
#[macro_export]
macro_rules! cbor_union {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident $(<$($g:ident),* $(,)?>)? {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($vty:ty)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name $(<$($g),*>)? {
            $( $(#[$vmeta])* $variant($vty) ),+
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::registry::CborSchema for $name $(<$($g),*>)? {
            fn describe() -> $crate::schema::TypeSpec {
                $crate::schema::TypeSpec::new(stringify!($name), $crate::schema::Category::Union)
                $(.variant(stringify!($variant)))+
            }
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::union::CborUnion for $name $(<$($g),*>)? {
            fn variants() -> ::std::vec::Vec<$crate::union::Variant<Self>> {
                ::std::vec![
                    $(
                        $crate::union::Variant::new(
                            stringify!($variant),
                            <$vty as $crate::codec::CborDecode>::leading_tag(),
                            |d| <$vty as $crate::codec::CborDecode>::decode(d).map($name::$variant),
                        ),
                    )+
                ]
            }
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::codec::CborEncode for $name $(<$($g),*>)? {
            fn encode<W: ::std::io::Write>(
                &self,
                e: &mut $crate::encoder::Encoder<W>,
            ) -> $crate::error::Result<()> {
                match self {
                    $( $name::$variant(inner) => $crate::codec::CborEncode::encode(inner, e), )+
                }
            }
        }

        impl<$($($g: $crate::codec::CborEncode + $crate::codec::CborDecode + 'static),*)?>
            $crate::codec::CborDecode for $name $(<$($g),*>)? {
            fn decode(d: &mut $crate::decoder::Decoder<'_>) -> $crate::error::Result<Self> {
                $crate::union::decode_union::<Self>(d)
            }
        }
    };
}
