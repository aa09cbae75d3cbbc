use syn::{Field, Ident, LitStr, Type, Visibility, parse::ParseBuffer};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) column: String,
    /// Only written when nothing else matches, read only as a primary key.
    pub(crate) hidden: bool,
    pub(crate) skip: bool,
}

pub(crate) fn decode_field(field: &Field) -> FieldMetadata {
    let Some(ident) = field.ident.clone() else {
        panic!("Model can only be derived on structs with named fields");
    };
    let mut column = ident.to_string();
    if let Some(raw) = column.strip_prefix("r#") {
        column = raw.to_string();
    }
    if column.starts_with('_') {
        column.remove(0);
    }
    let mut result = FieldMetadata {
        ident,
        ty: field.ty.clone(),
        column,
        hidden: !matches!(field.vis, Visibility::Public(..)),
        skip: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("plank") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `plank`, use it like: `#[plank(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("column") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `column`, use it like: `#[plank(column = \"my_column\")]`"
                    );
                };
                result.column = v.value();
            } else if arg.path.is_ident("skip") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `skip`, use it like: `#[plank(skip)]`");
                };
                result.skip = true;
            } else if arg.path.is_ident("hidden") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `hidden`, use it like: `#[plank(hidden)]`");
                };
                result.hidden = true;
            } else if arg.path.is_ident("visible") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `visible`, use it like: `#[plank(visible)]`");
                };
                result.hidden = false;
            } else {
                panic!(
                    "Unknown attribute on field `{}`, expected one of: column, skip, hidden, visible",
                    result.ident
                );
            }
            Ok(())
        });
    }
    result
}
