//! Textual type descriptions for class fields.
//!
//! The introspection oracle reports a class's own data members as run-time
//! values; this module renders each member's shape as a human-readable
//! declaration for documentation display. The rendering is purely
//! descriptive and is not required to round-trip.

use indexmap::IndexMap;

/// Primitive scalar kinds of the documented language's value system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Byte,
    Int,
    UInt,
    Long,
    ULong,
    Long64,
    ULong64,
    Float,
    Double,
    Complex,
    DComplex,
    Str,
    ObjRef,
    Pointer,
    Undefined,
}

impl ScalarKind {
    /// Element-kind name used by the sized-constructor array form.
    pub fn array_constructor(self) -> &'static str {
        match self {
            ScalarKind::Byte => "bytarr",
            ScalarKind::Int => "intarr",
            ScalarKind::UInt => "uintarr",
            ScalarKind::Long => "lonarr",
            ScalarKind::ULong => "ulonarr",
            ScalarKind::Long64 => "lon64arr",
            ScalarKind::ULong64 => "ulon64arr",
            ScalarKind::Float => "fltarr",
            ScalarKind::Double => "dblarr",
            ScalarKind::Complex => "complexarr",
            ScalarKind::DComplex => "dcomplexarr",
            ScalarKind::Str => "strarr",
            ScalarKind::ObjRef => "objarr",
            ScalarKind::Pointer => "ptrarr",
            ScalarKind::Undefined => "make_array",
        }
    }
}

/// A scalar value as reported by the introspection oracle.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Unsigned byte, doubling as the boolean kind.
    Byte(u8),
    /// 16-bit signed integer.
    Int(i16),
    /// 16-bit unsigned integer.
    UInt(u16),
    /// 32-bit signed integer.
    Long(i32),
    /// 32-bit unsigned integer.
    ULong(u32),
    /// 64-bit signed integer.
    Long64(i64),
    /// 64-bit unsigned integer.
    ULong64(u64),
    /// Single-precision floating point.
    Float(f32),
    /// Double-precision floating point.
    Double(f64),
    /// Single-precision complex pair.
    Complex(f32, f32),
    /// Double-precision complex pair.
    DComplex(f64, f64),
    /// String value.
    Str(String),
    /// Object reference, carrying the referenced class name when typed.
    ObjRef(Option<String>),
    /// Untyped heap pointer.
    Pointer,
    /// Undefined value.
    Undefined,
}

impl Scalar {
    /// The kind of this scalar.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Byte(_) => ScalarKind::Byte,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::UInt(_) => ScalarKind::UInt,
            Scalar::Long(_) => ScalarKind::Long,
            Scalar::ULong(_) => ScalarKind::ULong,
            Scalar::Long64(_) => ScalarKind::Long64,
            Scalar::ULong64(_) => ScalarKind::ULong64,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Double(_) => ScalarKind::Double,
            Scalar::Complex(_, _) => ScalarKind::Complex,
            Scalar::DComplex(_, _) => ScalarKind::DComplex,
            Scalar::Str(_) => ScalarKind::Str,
            Scalar::ObjRef(_) => ScalarKind::ObjRef,
            Scalar::Pointer => ScalarKind::Pointer,
            Scalar::Undefined => ScalarKind::Undefined,
        }
    }

    /// Literal-suffixed rendering of this scalar.
    pub fn render(&self) -> String {
        match self {
            Scalar::Byte(v) => format!("{v}B"),
            Scalar::Int(v) => format!("{v}S"),
            Scalar::UInt(v) => format!("{v}U"),
            Scalar::Long(v) => format!("{v}L"),
            Scalar::ULong(v) => format!("{v}UL"),
            Scalar::Long64(v) => format!("{v}LL"),
            Scalar::ULong64(v) => format!("{v}ULL"),
            Scalar::Float(v) => render_float(f64::from(*v)),
            Scalar::Double(v) => format!("{}D", render_float(*v)),
            Scalar::Complex(re, im) => {
                format!("complex({}, {})", render_float(f64::from(*re)), render_float(f64::from(*im)))
            }
            Scalar::DComplex(re, im) => {
                format!("dcomplex({}, {})", render_float(*re), render_float(*im))
            }
            Scalar::Str(s) => format!("'{s}'"),
            Scalar::ObjRef(Some(class)) => format!("objref({class})"),
            Scalar::ObjRef(None) => "objref".to_string(),
            Scalar::Pointer => "ptr_new()".to_string(),
            Scalar::Undefined => "<undefined>".to_string(),
        }
    }
}

/// Floats always render with a decimal point so the kind stays visible.
fn render_float(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// A run-time value shape reported by the introspection oracle for one
/// structure member.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    /// A single scalar.
    Scalar(Scalar),
    /// An array of scalars with explicit dimensions. `elements` holds the
    /// materialized values when the oracle provides them; a large array may
    /// be reported with dimensions only.
    Array {
        /// Element kind.
        kind: ScalarKind,
        /// Dimension list, innermost first.
        dims: Vec<usize>,
        /// Materialized element values, possibly empty.
        elements: Vec<Scalar>,
    },
    /// A structure value: ordered tag names with their own member shapes,
    /// replicated over `dims` (a plain struct has `dims == [1]`).
    Struct {
        /// Tag name to member shape, in declaration order.
        tags: IndexMap<String, RuntimeValue>,
        /// Dimension list; the element count is the product.
        dims: Vec<usize>,
    },
}

/// Maximum 1-D array length rendered as an explicit element list.
const MAX_LITERAL_ELEMENTS: usize = 5;

/// Render the type description of a run-time value.
///
/// Priority order: multi-element structures render as a replicate form,
/// single-element structures as a brace-delimited tag list, scalars as
/// literal-suffixed values, short 1-D arrays as explicit element lists, and
/// all other arrays as a sized-constructor naming the element kind.
pub fn describe(value: &RuntimeValue) -> String {
    match value {
        RuntimeValue::Struct { tags, dims } => {
            let body = describe_struct_body(tags);
            if element_count(dims) > 1 {
                format!("replicate({}, {})", body, dims_list(dims))
            } else {
                body
            }
        }
        RuntimeValue::Scalar(scalar) => scalar.render(),
        RuntimeValue::Array {
            kind,
            dims,
            elements,
        } => {
            if dims.len() == 1
                && dims[0] <= MAX_LITERAL_ELEMENTS
                && elements.len() == dims[0]
            {
                let parts: Vec<String> = elements.iter().map(Scalar::render).collect();
                format!("[{}]", parts.join(", "))
            } else {
                format!("{}({})", kind.array_constructor(), dims_list(dims))
            }
        }
    }
}

fn describe_struct_body(tags: &IndexMap<String, RuntimeValue>) -> String {
    let parts: Vec<String> = tags
        .iter()
        .map(|(name, value)| format!("{}: {}", name, describe(value)))
        .collect();
    format!("{{ {} }}", parts.join(", "))
}

fn element_count(dims: &[usize]) -> usize {
    dims.iter().product()
}

fn dims_list(dims: &[usize]) -> String {
    dims.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
