use super::crc;
use super::profile::{self, FieldKind, FIT_EPOCH_OFFSET, TIMESTAMP_FIELD};
use super::FitError;
use crate::domain::model::{Record, Value};
use chrono::DateTime;
use std::borrow::Cow;

const MAX_LOCAL_TYPES: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub check_crc: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { check_crc: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    pub data_size: u32,
    pub header_crc: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub number: u8,
    pub name: Cow<'static, str>,
    /// `None` when the raw bytes held the base type's invalid marker.
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    pub global: u16,
    pub fields: Vec<Field>,
}

impl DataMessage {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_ref())
    }

    /// Field name to value, skipping invalid fields.
    pub fn to_record(&self) -> Record {
        Record {
            data: self
                .fields
                .iter()
                .filter_map(|f| f.value.clone().map(|v| (f.name.to_string(), v)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FitFile {
    pub headers: Vec<FileHeader>,
    pub messages: Vec<DataMessage>,
}

impl FitFile {
    /// Decode a buffer holding one FIT file, or several chained back to back.
    pub fn from_bytes(buf: &[u8], options: DecodeOptions) -> Result<Self, FitError> {
        let mut headers = Vec::new();
        let mut messages = Vec::new();
        let mut pos = 0;

        while pos < buf.len() {
            let consumed = decode_one(&buf[pos..], options, &mut headers, &mut messages)?;
            pos += consumed;
        }

        if headers.is_empty() {
            return Err(FitError::Truncated { offset: 0 });
        }

        Ok(Self { headers, messages })
    }

    pub fn messages<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DataMessage> + 'a {
        let global = profile::message_number(name);
        self.messages
            .iter()
            .filter(move |m| Some(m.global) == global)
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldDef {
    number: u8,
    size: u8,
    base_type: u8,
}

#[derive(Debug, Clone)]
struct Definition {
    global: u16,
    big_endian: bool,
    fields: Vec<FieldDef>,
    developer_size: usize,
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], FitError> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.buf.len());
        match end {
            Some(end) => {
                let slice = &self.buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(FitError::Truncated {
                offset: self.base + self.pos,
            }),
        }
    }

    fn u8(&mut self) -> Result<u8, FitError> {
        Ok(self.take(1)?[0])
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }
}

fn parse_header(buf: &[u8], options: DecodeOptions) -> Result<FileHeader, FitError> {
    let header_size = *buf.first().ok_or(FitError::Truncated { offset: 0 })?;
    if header_size != 12 && header_size != 14 {
        return Err(FitError::InvalidHeaderSize(header_size));
    }
    if buf.len() < header_size as usize {
        return Err(FitError::Truncated { offset: buf.len() });
    }
    if &buf[8..12] != b".FIT" {
        return Err(FitError::BadSignature);
    }

    let header_crc = if header_size == 14 {
        let stored = u16::from_le_bytes([buf[12], buf[13]]);
        if stored != 0 && options.check_crc {
            let computed = crc::checksum(&buf[..12]);
            if computed != stored {
                return Err(FitError::CrcMismatch {
                    expected: stored,
                    computed,
                });
            }
        }
        Some(stored).filter(|&c| c != 0)
    } else {
        None
    };

    Ok(FileHeader {
        header_size,
        protocol_version: buf[1],
        profile_version: u16::from_le_bytes([buf[2], buf[3]]),
        data_size: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        header_crc,
    })
}

/// Decodes a single file at the start of `buf`; returns the bytes consumed.
fn decode_one(
    buf: &[u8],
    options: DecodeOptions,
    headers: &mut Vec<FileHeader>,
    messages: &mut Vec<DataMessage>,
) -> Result<usize, FitError> {
    let header = parse_header(buf, options)?;
    let data_start = header.header_size as usize;
    let data_end = data_start + header.data_size as usize;
    let file_end = data_end + 2;
    if buf.len() < file_end {
        return Err(FitError::Truncated { offset: buf.len() });
    }

    if options.check_crc {
        let stored = u16::from_le_bytes([buf[data_end], buf[data_end + 1]]);
        let computed = crc::checksum(&buf[..data_end]);
        if stored != computed {
            return Err(FitError::CrcMismatch {
                expected: stored,
                computed,
            });
        }
    }

    let mut cursor = Cursor {
        buf: &buf[data_start..data_end],
        pos: 0,
        base: data_start,
    };
    let mut definitions: [Option<Definition>; MAX_LOCAL_TYPES] = Default::default();
    let mut last_timestamp: Option<u32> = None;

    while !cursor.is_empty() {
        let record_header = cursor.u8()?;

        if record_header & 0x80 != 0 {
            // 壓縮時間戳記標頭
            let local = ((record_header >> 5) & 0x03) as usize;
            let offset = (record_header & 0x1F) as u32;
            let def = definitions[local]
                .as_ref()
                .ok_or(FitError::UndefinedLocalType(local as u8))?;
            let timestamp = last_timestamp.map(|last| {
                last.wrapping_add(offset.wrapping_sub(last) & 0x1F)
            });
            let mut message = read_data(&mut cursor, def, &mut last_timestamp)?;
            if let Some(ts) = timestamp {
                if !message.fields.iter().any(|f| f.number == TIMESTAMP_FIELD) {
                    message.fields.push(timestamp_field(ts));
                }
                last_timestamp = Some(ts);
            }
            messages.push(message);
            continue;
        }

        let local = (record_header & 0x0F) as usize;
        if record_header & 0x40 != 0 {
            let has_developer_data = record_header & 0x20 != 0;
            definitions[local] = Some(read_definition(&mut cursor, has_developer_data)?);
        } else {
            let def = definitions[local]
                .as_ref()
                .ok_or(FitError::UndefinedLocalType(local as u8))?;
            let message = read_data(&mut cursor, def, &mut last_timestamp)?;
            messages.push(message);
        }
    }

    headers.push(header);
    Ok(file_end)
}

fn read_definition(cursor: &mut Cursor<'_>, has_developer_data: bool) -> Result<Definition, FitError> {
    let _reserved = cursor.u8()?;
    let big_endian = cursor.u8()? == 1;
    let global_bytes = cursor.take(2)?;
    let global = if big_endian {
        u16::from_be_bytes([global_bytes[0], global_bytes[1]])
    } else {
        u16::from_le_bytes([global_bytes[0], global_bytes[1]])
    };

    let field_count = cursor.u8()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        let raw = cursor.take(3)?;
        fields.push(FieldDef {
            number: raw[0],
            size: raw[1],
            base_type: raw[2],
        });
    }

    let mut developer_size = 0;
    if has_developer_data {
        let dev_count = cursor.u8()?;
        for _ in 0..dev_count {
            let raw = cursor.take(3)?;
            developer_size += raw[1] as usize;
        }
    }

    Ok(Definition {
        global,
        big_endian,
        fields,
        developer_size,
    })
}

fn read_data(
    cursor: &mut Cursor<'_>,
    def: &Definition,
    last_timestamp: &mut Option<u32>,
) -> Result<DataMessage, FitError> {
    let mut fields = Vec::with_capacity(def.fields.len());

    for field_def in &def.fields {
        let bytes = cursor.take(field_def.size as usize)?;
        let raw = decode_raw(bytes, field_def.base_type, def.big_endian);

        if field_def.number == TIMESTAMP_FIELD {
            if let Some(Value::UInt(ts)) = raw {
                *last_timestamp = Some(ts as u32);
            }
        }

        fields.push(apply_profile(def.global, field_def.number, raw));
    }

    // developer fields are not interpreted
    cursor.take(def.developer_size)?;

    Ok(DataMessage {
        global: def.global,
        fields,
    })
}

fn timestamp_field(ts: u32) -> Field {
    apply_profile(profile::RECORD, TIMESTAMP_FIELD, Some(Value::UInt(ts as u64)))
}

fn apply_profile(global: u16, number: u8, raw: Option<Value>) -> Field {
    let Some(field) = profile::field_profile(global, number) else {
        return Field {
            number,
            name: Cow::Owned(format!("unknown_{}", number)),
            value: raw,
        };
    };

    let value = raw.and_then(|v| match field.kind {
        FieldKind::DateTime => to_date_time(&v),
        FieldKind::Plain if field.is_scaled() => Some(apply_scale(v, field.scale, field.offset)),
        FieldKind::Plain => Some(v),
    });

    Field {
        number,
        name: Cow::Borrowed(field.name),
        value,
    }
}

fn to_date_time(value: &Value) -> Option<Value> {
    let secs = match value {
        Value::UInt(v) => *v as i64,
        Value::Int(v) => *v,
        _ => return None,
    };
    secs.checked_add(FIT_EPOCH_OFFSET)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(Value::Timestamp)
}

fn apply_scale(value: Value, scale: f64, offset: f64) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| item.map(|v| apply_scale(v, scale, offset)))
                .collect(),
        ),
        other => match other.as_f64() {
            Some(v) => Value::Float(v / scale - offset),
            None => other,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseType {
    Enum,
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    String,
    Float32,
    Float64,
    UInt8z,
    UInt16z,
    UInt32z,
    Byte,
    SInt64,
    UInt64,
    UInt64z,
}

impl BaseType {
    fn from_byte(b: u8) -> Option<Self> {
        let ty = match b & 0x1F {
            0 => BaseType::Enum,
            1 => BaseType::SInt8,
            2 => BaseType::UInt8,
            3 => BaseType::SInt16,
            4 => BaseType::UInt16,
            5 => BaseType::SInt32,
            6 => BaseType::UInt32,
            7 => BaseType::String,
            8 => BaseType::Float32,
            9 => BaseType::Float64,
            10 => BaseType::UInt8z,
            11 => BaseType::UInt16z,
            12 => BaseType::UInt32z,
            13 => BaseType::Byte,
            14 => BaseType::SInt64,
            15 => BaseType::UInt64,
            16 => BaseType::UInt64z,
            _ => return None,
        };
        Some(ty)
    }

    fn size(self) -> usize {
        match self {
            BaseType::Enum
            | BaseType::SInt8
            | BaseType::UInt8
            | BaseType::String
            | BaseType::UInt8z
            | BaseType::Byte => 1,
            BaseType::SInt16 | BaseType::UInt16 | BaseType::UInt16z => 2,
            BaseType::SInt32 | BaseType::UInt32 | BaseType::Float32 | BaseType::UInt32z => 4,
            BaseType::Float64 | BaseType::SInt64 | BaseType::UInt64 | BaseType::UInt64z => 8,
        }
    }
}

fn decode_raw(bytes: &[u8], base_type: u8, big_endian: bool) -> Option<Value> {
    let base = BaseType::from_byte(base_type).unwrap_or(BaseType::Byte);
    let width = base.size();

    if base == BaseType::String {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..end]).into_owned();
        return (!text.is_empty()).then_some(Value::Text(text));
    }

    // 欄位大小不是型別寬度的倍數時，當成原始位元組處理
    let base = if bytes.len() % width != 0 {
        BaseType::Byte
    } else {
        base
    };

    if base == BaseType::Byte {
        if bytes.is_empty() || bytes.iter().all(|&b| b == 0xFF) {
            return None;
        }
        if bytes.len() == 1 {
            return Some(Value::UInt(bytes[0] as u64));
        }
        return Some(Value::Array(
            bytes.iter().map(|&b| Some(Value::UInt(b as u64))).collect(),
        ));
    }

    // 陣列元素保留原位置，無效值為 None
    let mut cells: Vec<Option<Value>> = bytes
        .chunks_exact(base.size())
        .map(|chunk| decode_scalar(chunk, base, big_endian))
        .collect();

    if cells.iter().all(Option::is_none) {
        return None;
    }
    if cells.len() == 1 {
        return cells.pop().flatten();
    }
    Some(Value::Array(cells))
}

fn read_bytes<const N: usize>(chunk: &[u8], big_endian: bool) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&chunk[..N]);
    if big_endian {
        out.reverse();
    }
    out
}

/// Decodes one element; `None` for the type's invalid marker.
fn decode_scalar(chunk: &[u8], base: BaseType, big_endian: bool) -> Option<Value> {
    match base {
        BaseType::Enum | BaseType::UInt8 => {
            (chunk[0] != 0xFF).then_some(Value::UInt(chunk[0] as u64))
        }
        BaseType::UInt8z => (chunk[0] != 0).then_some(Value::UInt(chunk[0] as u64)),
        BaseType::SInt8 => {
            let v = chunk[0] as i8;
            (v != i8::MAX).then_some(Value::Int(v as i64))
        }
        BaseType::SInt16 => {
            let v = i16::from_le_bytes(read_bytes(chunk, big_endian));
            (v != i16::MAX).then_some(Value::Int(v as i64))
        }
        BaseType::UInt16 => {
            let v = u16::from_le_bytes(read_bytes(chunk, big_endian));
            (v != u16::MAX).then_some(Value::UInt(v as u64))
        }
        BaseType::UInt16z => {
            let v = u16::from_le_bytes(read_bytes(chunk, big_endian));
            (v != 0).then_some(Value::UInt(v as u64))
        }
        BaseType::SInt32 => {
            let v = i32::from_le_bytes(read_bytes(chunk, big_endian));
            (v != i32::MAX).then_some(Value::Int(v as i64))
        }
        BaseType::UInt32 => {
            let v = u32::from_le_bytes(read_bytes(chunk, big_endian));
            (v != u32::MAX).then_some(Value::UInt(v as u64))
        }
        BaseType::UInt32z => {
            let v = u32::from_le_bytes(read_bytes(chunk, big_endian));
            (v != 0).then_some(Value::UInt(v as u64))
        }
        BaseType::Float32 => {
            let bits = u32::from_le_bytes(read_bytes(chunk, big_endian));
            (bits != u32::MAX).then(|| Value::Float(f32::from_bits(bits) as f64))
        }
        BaseType::Float64 => {
            let bits = u64::from_le_bytes(read_bytes(chunk, big_endian));
            (bits != u64::MAX).then(|| Value::Float(f64::from_bits(bits)))
        }
        BaseType::SInt64 => {
            let v = i64::from_le_bytes(read_bytes(chunk, big_endian));
            (v != i64::MAX).then_some(Value::Int(v))
        }
        BaseType::UInt64 => {
            let v = u64::from_le_bytes(read_bytes(chunk, big_endian));
            (v != u64::MAX).then_some(Value::UInt(v))
        }
        BaseType::UInt64z => {
            let v = u64::from_le_bytes(read_bytes(chunk, big_endian));
            (v != 0).then_some(Value::UInt(v))
        }
        BaseType::String | BaseType::Byte => None,
    }
}
