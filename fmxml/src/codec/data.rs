//! Variables, fields, inserted text and URL requests.

use fmscript::{FieldRef, Instruction};
use roxmltree::Node;

use super::{calc_direct, calc_in, child, non_empty, own_text, state_of, text_of};
use crate::element::Element;

pub(crate) fn set_variable(name: &str, value: &str, repetition: Option<&str>) -> Vec<Element> {
    vec![
        Element::wrapped_calculation("Value", value),
        Element::wrapped_calculation("Repetition", repetition.unwrap_or("1")),
        Element::new("Name").text(name),
    ]
}

pub(crate) fn set_field_by_name(target: &str, value: &str) -> Vec<Element> {
    vec![
        Element::wrapped_calculation("Result", value),
        Element::wrapped_calculation("TargetName", target),
    ]
}

pub(crate) fn set_field(field: &FieldRef, value: Option<&str>) -> Vec<Element> {
    let mut out = Vec::new();
    if let Some(value) = value {
        out.push(Element::calculation(value));
    }
    out.push(field_element(field));
    out
}

/// `<Field table="T" id="0" name="F">`; the table attribute is omitted for bare names.
pub(crate) fn field_element(field: &FieldRef) -> Element {
    let mut element = Element::new("Field");
    if let Some(table) = &field.table {
        element.set_attr("table", table.as_str());
    }
    element.attr("id", "0").attr("name", field.name.as_str())
}

/// Read `<Field table name>` as a field reference.
pub(crate) fn decode_field(node: Node<'_, '_>) -> Option<FieldRef> {
    let field = child(node, "Field")?;
    let name = field.attribute("name").filter(|n| !n.is_empty())?;
    Some(FieldRef {
        table: field.attribute("table").filter(|t| !t.is_empty()).map(str::to_string),
        name: name.to_string(),
    })
}

/// Borrowed parameters of an Insert from URL step.
pub(crate) struct UrlRequest<'a> {
    pub target: Option<&'a str>,
    pub url: Option<&'a str>,
    pub curl: Option<&'a str>,
    pub select_all: bool,
    pub no_dialog: bool,
    pub verify_ssl: bool,
    pub dont_encode_url: bool,
}

pub(crate) fn insert_from_url(request: UrlRequest<'_>) -> Vec<Element> {
    let mut out = vec![
        Element::state("NoInteract", request.no_dialog),
        Element::state("DontEncodeURL", request.dont_encode_url),
        Element::state("SelectAll", request.select_all),
        Element::state("VerifySSLCertificates", request.verify_ssl),
    ];
    if let Some(target) = request.target {
        out.push(Element::new("Field").text(target));
    }
    if let Some(url) = request.url {
        out.push(Element::wrapped_calculation("URL", url));
    }
    if let Some(curl) = request.curl {
        out.push(Element::wrapped_calculation("CURLOptions", curl));
    }
    out
}

pub(crate) fn insert_text(select_all: bool, target: Option<&str>, text: &str) -> Vec<Element> {
    let mut out = vec![Element::state("SelectAll", select_all), Element::new("Text").text(text)];
    if let Some(target) = target {
        out.push(Element::new("Field").text(target));
    }
    out
}

pub(crate) fn decode_set_variable(node: Node<'_, '_>) -> Instruction {
    Instruction::SetVariable {
        name: non_empty(text_of(node, "Name")).unwrap_or_else(|| "$?".to_string()),
        value: calc_in(node, "Value").unwrap_or_default(),
        repetition: non_empty(calc_in(node, "Repetition")).filter(|rep| rep != "1"),
    }
}

pub(crate) fn decode_set_field_by_name(node: Node<'_, '_>) -> Instruction {
    Instruction::SetFieldByName {
        target: non_empty(calc_in(node, "TargetName")).unwrap_or_else(|| "?".to_string()),
        value: calc_in(node, "Result").unwrap_or_default(),
    }
}

pub(crate) fn decode_set_field(node: Node<'_, '_>) -> Instruction {
    Instruction::SetField {
        field: decode_field(node).unwrap_or_else(|| FieldRef::parse("?")),
        value: non_empty(calc_direct(node)),
    }
}

/// The target may be written as `<Field>` text, a nested calculation, or a field reference.
pub(crate) fn decode_insert_from_url(node: Node<'_, '_>) -> Instruction {
    let target = child(node, "Field").and_then(|field| {
        non_empty(Some(own_text(field)))
            .or_else(|| non_empty(calc_direct(field)))
            .or_else(|| decode_field(node).map(|f| f.to_string()))
    });

    Instruction::InsertFromUrl {
        target,
        url: non_empty(calc_in(node, "URL")),
        curl: non_empty(calc_in(node, "CURLOptions")),
        select_all: state_of(node, "SelectAll"),
        no_dialog: state_of(node, "NoInteract"),
        verify_ssl: state_of(node, "VerifySSLCertificates"),
        dont_encode_url: state_of(node, "DontEncodeURL"),
    }
}

pub(crate) fn decode_insert_text(node: Node<'_, '_>) -> Instruction {
    Instruction::InsertText {
        select_all: state_of(node, "SelectAll"),
        target: non_empty(text_of(node, "Field")),
        text: text_of(node, "Text").unwrap_or_default(),
    }
}
