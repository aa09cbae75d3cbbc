use convert_case::{Case, Casing};
use syn::{ItemStruct, LitStr, Path, parse::ParseBuffer};

pub(crate) struct ModelMetadata {
    pub(crate) table: String,
    /// Function extending the derived accessors: `fn(Accessors<Self>) -> Accessors<Self>`.
    pub(crate) accessors: Option<Path>,
    /// The type implements `Callbacks` by hand.
    pub(crate) callbacks: bool,
}

pub(crate) fn decode_model(item: &ItemStruct) -> ModelMetadata {
    let mut table = item.ident.to_string().to_case(Case::Snake);
    if table.starts_with('_') {
        table.remove(0);
    }
    let mut result = ModelMetadata {
        table,
        accessors: None,
        callbacks: false,
    };
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("plank") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `plank`, use it like: `#[plank(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `table`, use it like: `#[plank(table = \"users\")]`");
                };
                result.table = v.value();
            } else if arg.path.is_ident("accessors") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Path>) else {
                    panic!(
                        "Error while parsing `accessors`, use it like: `#[plank(accessors = path::to::function)]`"
                    );
                };
                result.accessors = Some(v);
            } else if arg.path.is_ident("callbacks") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `callbacks`, use it like: `#[plank(callbacks)]`");
                };
                result.callbacks = true;
            } else {
                panic!(
                    "Unknown attribute `{}` on `{}`, expected one of: table, accessors, callbacks",
                    arg.path
                        .get_ident()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    item.ident
                );
            }
            Ok(())
        });
    }
    if result.table.is_empty() {
        panic!("The table name of `{}` cannot be empty", item.ident);
    }
    result
}
