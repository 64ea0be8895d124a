use serde::ser::{self, Serialize};
use std::fmt;
use thiserror::Error;

use crate::structure::Structure;

/// Error returned when a value cannot be lifted into a [`Structure`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    /// A `Serialize` implementation reported a failure.
    #[error("serialization failed: {0}")]
    Custom(String),
}

impl ser::Error for StructureError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        StructureError::Custom(msg.to_string())
    }
}

/// Serde serializer producing [`Structure`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureSerializer;

/// How a finished compound body is wrapped.
#[derive(Debug, Clone, Copy)]
enum Wrap {
    Plain,
    Named(&'static str),
    Variant(&'static str, &'static str),
}

impl Wrap {
    fn finish(self, body: Structure) -> Structure {
        match self {
            Wrap::Plain => body,
            Wrap::Named(name) => Structure::Named(name, Box::new(body)),
            Wrap::Variant(name, variant) => Structure::Variant {
                name,
                variant,
                content: Some(Box::new(body)),
            },
        }
    }
}

/// Collects sequence-like compounds.
#[doc(hidden)]
pub struct SeqBuilder {
    items: Vec<Structure>,
    wrap: Wrap,
}

impl SeqBuilder {
    fn new(wrap: Wrap, len: Option<usize>) -> Self {
        Self {
            items: Vec::with_capacity(len.unwrap_or(0)),
            wrap,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), StructureError> {
        self.items.push(value.serialize(StructureSerializer)?);
        Ok(())
    }

    fn finish(self) -> Structure {
        self.wrap.finish(Structure::Seq(self.items))
    }
}

/// Collects map-like compounds, structs included.
#[doc(hidden)]
pub struct MapBuilder {
    entries: Vec<(Structure, Structure)>,
    pending_key: Option<Structure>,
    wrap: Wrap,
}

impl MapBuilder {
    fn new(wrap: Wrap, len: Option<usize>) -> Self {
        Self {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
            wrap,
        }
    }

    fn push_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), StructureError> {
        let value = value.serialize(StructureSerializer)?;
        self.entries.push((Structure::Str(key.to_string()), value));
        Ok(())
    }

    fn finish(self) -> Structure {
        self.wrap.finish(Structure::Map(self.entries))
    }
}

impl ser::Serializer for StructureSerializer {
    type Ok = Structure;
    type Error = StructureError;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = SeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = MapBuilder;

    fn serialize_bool(self, v: bool) -> Result<Structure, StructureError> {
        Ok(Structure::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Structure, StructureError> {
        Ok(Structure::Int(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<Structure, StructureError> {
        // Only values above i128::MAX lose precision.
        Ok(i128::try_from(v).map_or(Structure::Float(v as f64), Structure::Int))
    }

    fn serialize_f32(self, v: f32) -> Result<Structure, StructureError> {
        Ok(Structure::from_f64(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Structure, StructureError> {
        Ok(Structure::from_f64(v))
    }

    fn serialize_char(self, v: char) -> Result<Structure, StructureError> {
        Ok(Structure::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Structure, StructureError> {
        Ok(Structure::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Structure, StructureError> {
        Ok(Structure::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Structure, StructureError> {
        Ok(Structure::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Structure, StructureError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Structure, StructureError> {
        Ok(Structure::Null)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Structure, StructureError> {
        Ok(Structure::Named(name, Box::new(Structure::Null)))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Structure, StructureError> {
        Ok(Structure::Variant {
            name,
            variant,
            content: None,
        })
    }

    fn serialize_newtype_struct<T>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Structure, StructureError>
    where
        T: ?Sized + Serialize,
    {
        Ok(Structure::Named(name, Box::new(value.serialize(self)?)))
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Structure, StructureError>
    where
        T: ?Sized + Serialize,
    {
        Ok(Structure::Variant {
            name,
            variant,
            content: Some(Box::new(value.serialize(self)?)),
        })
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, StructureError> {
        Ok(SeqBuilder::new(Wrap::Plain, len))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, StructureError> {
        Ok(SeqBuilder::new(Wrap::Plain, Some(len)))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, StructureError> {
        Ok(SeqBuilder::new(Wrap::Named(name), Some(len)))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, StructureError> {
        Ok(SeqBuilder::new(Wrap::Variant(name, variant), Some(len)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, StructureError> {
        Ok(MapBuilder::new(Wrap::Plain, len))
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<MapBuilder, StructureError> {
        Ok(MapBuilder::new(Wrap::Named(name), Some(len)))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<MapBuilder, StructureError> {
        Ok(MapBuilder::new(Wrap::Variant(name, variant), Some(len)))
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Structure;
    type Error = StructureError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), StructureError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Structure, StructureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Structure;
    type Error = StructureError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), StructureError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Structure, StructureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Structure;
    type Error = StructureError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), StructureError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Structure, StructureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqBuilder {
    type Ok = Structure;
    type Error = StructureError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), StructureError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Structure, StructureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Structure;
    type Error = StructureError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), StructureError>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key.serialize(StructureSerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), StructureError>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| StructureError::Custom("map value emitted before its key".into()))?;
        self.entries.push((key, value.serialize(StructureSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Structure, StructureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = Structure;
    type Error = StructureError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), StructureError>
    where
        T: ?Sized + Serialize,
    {
        self.push_field(key, value)
    }

    fn end(self) -> Result<Structure, StructureError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for MapBuilder {
    type Ok = Structure;
    type Error = StructureError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), StructureError>
    where
        T: ?Sized + Serialize,
    {
        self.push_field(key, value)
    }

    fn end(self) -> Result<Structure, StructureError> {
        Ok(self.finish())
    }
}
