//! Reversible feature codec for typed records.
//!
//! A record type describes itself once through a [`RecordSchema`]: an ordered
//! list of fields, each categorical (a closed list of canonical labels) or
//! numeric. [`encode`] walks that list and emits a one-hot block per
//! categorical field and a single scalar per numeric field; [`decode`] walks
//! the same list backwards into typed values.
//!
//! ```
//! use dsg_algo::codec::{decode, encode, FeatureRecord};
//! use dsg_core::{NodeAttrs, PhaseType};
//!
//! let attrs = NodeAttrs::new(PhaseType::AB, 2, 12.47);
//! let vector = encode(&attrs).unwrap();
//! assert_eq!(vector.len(), NodeAttrs::schema().width());
//! assert_eq!(decode::<NodeAttrs>(&vector).unwrap(), attrs);
//! ```

use dsg_core::{DsgError, DsgResult};

/// How a field is laid out in a feature vector.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// One-hot block, one slot per canonical label
    Categorical(Vec<&'static str>),
    /// Single scalar
    Numeric,
    /// Free text; declared so records can describe themselves fully, never encodable
    Text,
}

impl FieldKind {
    /// Number of vector positions the field occupies.
    pub fn width(&self) -> usize {
        match self {
            FieldKind::Categorical(labels) => labels.len(),
            FieldKind::Numeric => 1,
            FieldKind::Text => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn categorical<T: CategoricalField>(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Categorical(T::labels()),
        }
    }

    pub fn numeric(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Numeric,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }
}

/// Ordered field layout of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub record: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(record: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { record, fields }
    }

    /// Length of an encoded vector.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|field| field.kind.width()).sum()
    }

    /// One name per vector position: `field=LABEL` for one-hot slots, the
    /// field name for scalars.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width());
        for field in &self.fields {
            match &field.kind {
                FieldKind::Categorical(labels) => {
                    names.extend(labels.iter().map(|label| format!("{}={label}", field.name)));
                }
                FieldKind::Numeric => names.push(field.name.to_string()),
                FieldKind::Text => {}
            }
        }
        names
    }

    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Value of one field, in schema terms.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Slot of the canonical label
    Category(usize),
    Number(f64),
    Text(String),
}

/// An enumeration with a fixed list of canonical values.
///
/// Slot order is the order of [`CategoricalField::VALUES`].
pub trait CategoricalField: Copy + PartialEq + Sized + 'static {
    const VALUES: &'static [Self];

    fn label(&self) -> &'static str;

    fn labels() -> Vec<&'static str> {
        Self::VALUES.iter().map(|value| value.label()).collect()
    }

    fn slot(&self) -> usize {
        Self::VALUES
            .iter()
            .position(|value| value == self)
            .unwrap_or(Self::VALUES.len())
    }

    fn from_slot(slot: usize) -> Option<Self> {
        Self::VALUES.get(slot).copied()
    }
}

/// A record the codec can turn into a feature vector and back.
pub trait FeatureRecord: Sized {
    fn schema() -> &'static RecordSchema;

    /// Field values in schema order.
    fn to_values(&self) -> Vec<FieldValue>;

    fn from_values(values: Vec<FieldValue>) -> DsgResult<Self>;
}

/// Flatten a record into its feature vector.
pub fn encode<R: FeatureRecord>(record: &R) -> DsgResult<Vec<f64>> {
    encode_values(R::schema(), &record.to_values())
}

/// Flatten field values laid out by `schema`.
pub fn encode_values(schema: &RecordSchema, values: &[FieldValue]) -> DsgResult<Vec<f64>> {
    if values.len() != schema.fields.len() {
        return Err(DsgError::SchemaMismatch {
            record: schema.record,
            expected: schema.fields.len(),
            found: values.len(),
        });
    }
    let mut vector = Vec::with_capacity(schema.width());
    for (field, value) in schema.fields.iter().zip(values) {
        match (&field.kind, value) {
            (FieldKind::Categorical(labels), FieldValue::Category(slot)) if *slot < labels.len() => {
                vector.extend((0..labels.len()).map(|i| if i == *slot { 1.0 } else { 0.0 }));
            }
            (FieldKind::Categorical(labels), FieldValue::Category(slot)) => {
                return Err(DsgError::invalid(
                    schema.record,
                    field.name,
                    format!("slot {slot} outside {} canonical values", labels.len()),
                ));
            }
            (FieldKind::Numeric, FieldValue::Number(x)) => vector.push(*x),
            _ => {
                return Err(DsgError::UnsupportedField {
                    record: schema.record,
                    field: field.name,
                })
            }
        }
    }
    Ok(vector)
}

/// Rebuild a record from its feature vector.
pub fn decode<R: FeatureRecord>(vector: &[f64]) -> DsgResult<R> {
    R::from_values(decode_values(R::schema(), vector)?)
}

/// Split a feature vector into field values laid out by `schema`.
///
/// A one-hot block decodes to the first slot whose pattern it matches
/// exactly.
pub fn decode_values(schema: &RecordSchema, vector: &[f64]) -> DsgResult<Vec<FieldValue>> {
    let width = schema.width();
    if vector.len() != width {
        return Err(DsgError::Decode {
            record: schema.record,
            reason: format!("expected {width} values, found {}", vector.len()),
        });
    }
    let mut values = Vec::with_capacity(schema.fields.len());
    let mut offset = 0;
    for field in &schema.fields {
        match &field.kind {
            FieldKind::Categorical(labels) => {
                let block = &vector[offset..offset + labels.len()];
                let slot = (0..labels.len())
                    .find(|&candidate| {
                        block.iter().enumerate().all(|(i, &x)| {
                            x == if i == candidate { 1.0 } else { 0.0 }
                        })
                    })
                    .ok_or_else(|| DsgError::Decode {
                        record: schema.record,
                        reason: format!("{} block {block:?} is not one-hot", field.name),
                    })?;
                values.push(FieldValue::Category(slot));
                offset += labels.len();
            }
            FieldKind::Numeric => {
                values.push(FieldValue::Number(vector[offset]));
                offset += 1;
            }
            FieldKind::Text => {
                return Err(DsgError::UnsupportedField {
                    record: schema.record,
                    field: field.name,
                })
            }
        }
    }
    Ok(values)
}

/// Typed reader over decoded field values, used by [`FeatureRecord::from_values`].
pub struct ValueCursor {
    schema: &'static RecordSchema,
    values: std::vec::IntoIter<FieldValue>,
}

impl ValueCursor {
    pub fn new(schema: &'static RecordSchema, values: Vec<FieldValue>) -> DsgResult<Self> {
        if values.len() != schema.fields.len() {
            return Err(DsgError::SchemaMismatch {
                record: schema.record,
                expected: schema.fields.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            schema,
            values: values.into_iter(),
        })
    }

    fn next(&mut self, field: &'static str) -> DsgResult<FieldValue> {
        self.values.next().ok_or_else(|| DsgError::Decode {
            record: self.schema.record,
            reason: format!("missing value for {field}"),
        })
    }

    pub fn category<T: CategoricalField>(&mut self, field: &'static str) -> DsgResult<T> {
        match self.next(field)? {
            FieldValue::Category(slot) => T::from_slot(slot).ok_or_else(|| DsgError::Decode {
                record: self.schema.record,
                reason: format!("{field} slot {slot} has no canonical value"),
            }),
            _ => Err(self.unexpected(field)),
        }
    }

    pub fn number(&mut self, field: &'static str) -> DsgResult<f64> {
        match self.next(field)? {
            FieldValue::Number(x) => Ok(x),
            _ => Err(self.unexpected(field)),
        }
    }

    /// Integer field stored as a float; restored by rounding.
    pub fn count(&mut self, field: &'static str) -> DsgResult<u32> {
        let x = self.number(field)?.round();
        if !(0.0..=f64::from(u32::MAX)).contains(&x) {
            return Err(DsgError::Decode {
                record: self.schema.record,
                reason: format!("{field} value {x} is not a count"),
            });
        }
        Ok(x as u32)
    }

    fn unexpected(&self, field: &'static str) -> DsgError {
        match self.schema.field(field).map(|spec| &spec.kind) {
            Some(FieldKind::Text) | None => DsgError::UnsupportedField {
                record: self.schema.record,
                field,
            },
            Some(_) => DsgError::Decode {
                record: self.schema.record,
                reason: format!("value for {field} does not match its kind"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    impl CategoricalField for Color {
        const VALUES: &'static [Self] = &[Color::Red, Color::Green, Color::Blue];

        fn label(&self) -> &'static str {
            match self {
                Color::Red => "RED",
                Color::Green => "GREEN",
                Color::Blue => "BLUE",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Swatch {
        color: Color,
        weight: f64,
    }

    static SWATCH: Lazy<RecordSchema> = Lazy::new(|| {
        RecordSchema::new(
            "swatch",
            vec![
                FieldSpec::categorical::<Color>("color"),
                FieldSpec::numeric("weight"),
            ],
        )
    });

    impl FeatureRecord for Swatch {
        fn schema() -> &'static RecordSchema {
            &SWATCH
        }

        fn to_values(&self) -> Vec<FieldValue> {
            vec![
                FieldValue::Category(self.color.slot()),
                FieldValue::Number(self.weight),
            ]
        }

        fn from_values(values: Vec<FieldValue>) -> DsgResult<Self> {
            let mut cursor = ValueCursor::new(Self::schema(), values)?;
            Ok(Self {
                color: cursor.category("color")?,
                weight: cursor.number("weight")?,
            })
        }
    }

    #[derive(Debug)]
    struct Labelled {
        name: String,
    }

    static LABELLED: Lazy<RecordSchema> =
        Lazy::new(|| RecordSchema::new("labelled", vec![FieldSpec::text("name")]));

    impl FeatureRecord for Labelled {
        fn schema() -> &'static RecordSchema {
            &LABELLED
        }

        fn to_values(&self) -> Vec<FieldValue> {
            vec![FieldValue::Text(self.name.clone())]
        }

        fn from_values(_: Vec<FieldValue>) -> DsgResult<Self> {
            Err(DsgError::UnsupportedField {
                record: "labelled",
                field: "name",
            })
        }
    }

    #[test]
    fn encodes_one_hot_then_scalar() {
        let swatch = Swatch {
            color: Color::Green,
            weight: 2.5,
        };
        assert_eq!(encode(&swatch).unwrap(), vec![0.0, 1.0, 0.0, 2.5]);
        assert_eq!(decode::<Swatch>(&[0.0, 1.0, 0.0, 2.5]).unwrap(), swatch);
    }

    #[test]
    fn column_names_follow_layout() {
        assert_eq!(
            Swatch::schema().column_names(),
            ["color=RED", "color=GREEN", "color=BLUE", "weight"]
        );
    }

    #[test]
    fn text_field_is_unsupported() {
        let err = encode(&Labelled { name: "x".into() }).unwrap_err();
        assert_eq!(
            err,
            DsgError::UnsupportedField {
                record: "labelled",
                field: "name"
            }
        );
        assert!(matches!(
            decode_values(Labelled::schema(), &[]),
            Err(DsgError::UnsupportedField { .. })
        ));
    }

    #[test]
    fn wrong_length_fails_to_decode() {
        assert!(matches!(
            decode::<Swatch>(&[1.0, 0.0, 0.0]),
            Err(DsgError::Decode { record: "swatch", .. })
        ));
    }

    #[test]
    fn block_without_match_fails_to_decode() {
        for block in [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.5, 0.0, 0.0]] {
            let mut vector = block.to_vec();
            vector.push(1.0);
            assert!(
                matches!(decode::<Swatch>(&vector), Err(DsgError::Decode { .. })),
                "{block:?}"
            );
        }
    }

    #[test]
    fn mismatched_value_kind_is_unsupported() {
        let values = [FieldValue::Number(1.0), FieldValue::Number(1.0)];
        assert!(matches!(
            encode_values(Swatch::schema(), &values),
            Err(DsgError::UnsupportedField { field: "color", .. })
        ));
        assert!(matches!(
            encode_values(Swatch::schema(), &values[..1]),
            Err(DsgError::SchemaMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn cursor_rounds_counts() {
        static COUNTED: Lazy<RecordSchema> =
            Lazy::new(|| RecordSchema::new("counted", vec![FieldSpec::numeric("n")]));
        let mut cursor = ValueCursor::new(&COUNTED, vec![FieldValue::Number(2.9999999)]).unwrap();
        assert_eq!(cursor.count("n").unwrap(), 3);
        let mut cursor = ValueCursor::new(&COUNTED, vec![FieldValue::Number(-4.0)]).unwrap();
        assert!(cursor.count("n").is_err());
    }
}
