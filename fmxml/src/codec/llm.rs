//! AI steps. Their parameters live in a nested `<ConfigureLLMTemplate>` or
//! `<LLMRequest>` element; the target field and stream flag sit on the step.

use fmscript::{Instruction, LlmRequest};
use roxmltree::Node;

use super::data::{decode_field, field_element};
use super::{calc_in, child, non_empty, own_text, state_of, text_of};
use crate::element::Element;

pub(crate) fn configure_llm_template(template: Option<&str>, provider: Option<&str>) -> Vec<Element> {
    let mut config = Element::new("ConfigureLLMTemplate");
    if let Some(template) = template {
        config.push(Element::wrapped_calculation("TemplateName", template));
    }
    if let Some(provider) = provider {
        config.push(Element::new("ModelProvider").text(provider));
    }
    vec![config]
}

pub(crate) fn llm_request(request: &LlmRequest) -> Vec<Element> {
    let mut body = Element::new("LLMRequest");
    if let Some(action) = &request.action {
        body.push(Element::new("Action").text(action.as_str()));
    }
    if let Some(account) = &request.account {
        body.push(Element::wrapped_calculation("AccountName", account));
    }
    if let Some(model) = &request.model {
        body.push(Element::wrapped_calculation("Model", model));
    }
    if let Some(prompt) = &request.prompt {
        body.push(Element::wrapped_calculation("PromptMessage", prompt));
    }
    if let Some(scope) = &request.scope {
        body.push(Element::new("QueryScope").text(scope.as_str()));
    }
    if !request.tables.is_empty() {
        let mut aliases = Element::new("TableAliases");
        for table in &request.tables {
            aliases.push(Element::new("Table").attr("name", table.as_str()));
        }
        body.push(aliases);
    }

    let mut out = vec![body];
    if let Some(target) = &request.target {
        out.push(field_element(target));
    }
    out.push(Element::state("Stream", request.stream));
    out
}

pub(crate) fn decode_configure_llm_template(node: Node<'_, '_>) -> Instruction {
    let Some(config) = child(node, "ConfigureLLMTemplate") else {
        return Instruction::ConfigureLlmTemplate { template: None, provider: None };
    };
    Instruction::ConfigureLlmTemplate {
        template: non_empty(calc_in(config, "TemplateName")),
        provider: non_empty(text_of(config, "ModelProvider")),
    }
}

pub(crate) fn decode_llm_request(node: Node<'_, '_>) -> Instruction {
    let mut request = LlmRequest {
        target: decode_field(node),
        stream: state_of(node, "Stream"),
        ..LlmRequest::default()
    };

    if let Some(body) = child(node, "LLMRequest") {
        request.action = non_empty(text_of(body, "Action"));
        request.model = non_empty(calc_in(body, "Model"));
        request.account = non_empty(calc_in(body, "AccountName"));
        request.prompt = non_empty(calc_in(body, "PromptMessage"));
        request.scope = non_empty(child(body, "QueryScope").map(own_text));
        request.tables = child(body, "TableAliases")
            .map(|aliases| {
                aliases
                    .children()
                    .filter(|t| t.has_tag_name("Table"))
                    .filter_map(|t| t.attribute("name"))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
    }

    Instruction::LlmRequest(request)
}
