//! SDL printing.

use crate::descriptor::{FieldDef, InputFieldDef, SchemaDescriptor, TypeDef};
use indexmap::IndexMap;
use std::fmt::Write;

impl SchemaDescriptor {
    /// Prints the schema as SDL. Built-in scalars are omitted.
    pub fn to_sdl(&self) -> String {
        let mut out = String::new();
        for ty in self.types.values().filter(|ty| !ty.is_builtin()) {
            if !out.is_empty() {
                out.push('\n');
            }
            print_type(&mut out, ty);
        }
        out
    }
}

fn print_description(out: &mut String, description: Option<&str>, indent: &str) {
    let Some(description) = description else {
        return;
    };
    if description.contains('\n') {
        let _ = writeln!(out, "{indent}\"\"\"");
        for line in description.lines() {
            let _ = writeln!(out, "{indent}{line}");
        }
        let _ = writeln!(out, "{indent}\"\"\"");
    } else {
        let escaped = description.replace('\\', "\\\\").replace('"', "\\\"");
        let _ = writeln!(out, "{indent}\"{escaped}\"");
    }
}

fn print_type(out: &mut String, ty: &TypeDef) {
    match ty {
        TypeDef::Scalar(scalar) => {
            print_description(out, scalar.description.as_deref(), "");
            let _ = writeln!(out, "scalar {}", scalar.name);
        }
        TypeDef::Enum(def) => {
            print_description(out, def.description.as_deref(), "");
            let _ = writeln!(out, "enum {} {{", def.name);
            for value in &def.values {
                let _ = writeln!(out, "  {value}");
            }
            out.push_str("}\n");
        }
        TypeDef::InputObject(def) => {
            print_description(out, def.description.as_deref(), "");
            let _ = writeln!(out, "input {} {{", def.name);
            for field in def.fields.values() {
                print_description(out, field.description.as_deref(), "  ");
                let _ = writeln!(out, "  {}: {}", field.name, field.ty);
            }
            out.push_str("}\n");
        }
        TypeDef::Interface(def) => {
            print_description(out, def.description.as_deref(), "");
            let _ = writeln!(out, "interface {} {{", def.name);
            print_fields(out, &def.fields);
            out.push_str("}\n");
        }
        TypeDef::Object(def) => {
            print_description(out, def.description.as_deref(), "");
            let _ = write!(out, "type {}", def.name);
            if !def.implements.is_empty() {
                let _ = write!(out, " implements {}", def.implements.join(" & "));
            }
            out.push_str(" {\n");
            print_fields(out, &def.fields);
            out.push_str("}\n");
        }
    }
}

fn print_fields(out: &mut String, fields: &IndexMap<String, FieldDef>) {
    for field in fields.values() {
        print_description(out, field.description.as_deref(), "  ");
        let _ = write!(out, "  {}", field.name);
        print_arguments(out, &field.arguments);
        let _ = writeln!(out, ": {}", field.ty);
    }
}

fn print_arguments(out: &mut String, arguments: &IndexMap<String, InputFieldDef>) {
    if arguments.is_empty() {
        return;
    }
    let rendered: Vec<String> = arguments
        .values()
        .map(|arg| format!("{}: {}", arg.name, arg.ty))
        .collect();
    let _ = write!(out, "({})", rendered.join(", "));
}
