use winnow::ascii::till_line_ending;
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{Action, Condition, Effect, Operator, OptionValue, ProductOption, Rule, Test};

use super::parser::ParsedCatalog;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers ------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || c == '_' || c == '.'
        }),
    )
        .take()
        .parse_next(input)
}

// -- Values -----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

/// Value codes may start with a digit and contain dashes (`2-inch`, `v-17`).
fn bare_code<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
    })
    .parse_next(input)
}

fn value_code(input: &mut &str) -> ModalResult<String> {
    ws.parse_next(input)?;
    alt((string_literal, bare_code.map(str::to_owned)))
        .context(StrContext::Expected(StrContextValue::Description(
            "value code",
        )))
        .parse_next(input)
}

fn code_list(input: &mut &str) -> ModalResult<Vec<String>> {
    ws.parse_next(input)?;
    '['.parse_next(input)?;
    let codes: Vec<String> = cut_err(separated(1.., value_code, (ws, ',')))
        .context(StrContext::Expected(StrContextValue::Description(
            "list of value codes",
        )))
        .parse_next(input)?;
    (ws, cut_err(']')).parse_next(input)?;
    Ok(codes)
}

// -- Option definitions -----------------------------------------------------

fn option_flags<'i>(input: &mut &'i str) -> ModalResult<Vec<&'i str>> {
    delimited(
        (ws, '(', ws),
        cut_err(separated(1.., alt(("required", "hidden")), (ws, ',', ws))),
        (ws, cut_err(')')),
    )
    .parse_next(input)
}

fn value_id(input: &mut &str) -> ModalResult<String> {
    delimited((ws, '(', ws, "id"), cut_err(value_code), (ws, cut_err(')'))).parse_next(input)
}

fn value_def(input: &mut &str) -> ModalResult<OptionValue> {
    let code = value_code.parse_next(input)?;
    let label = opt(preceded(ws, string_literal)).parse_next(input)?;
    let id = opt(value_id).parse_next(input)?;

    let label = label.unwrap_or_else(|| code.clone());
    Ok(match id {
        Some(id) => OptionValue::with_id(id, code, label),
        None => OptionValue::new(code, label),
    })
}

fn option_def(input: &mut &str) -> ModalResult<ProductOption> {
    ws.parse_next(input)?;
    "option".parse_next(input)?;
    ws.parse_next(input)?;

    let key = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "option key",
        )))
        .parse_next(input)?;

    let label = opt(preceded(ws, string_literal)).parse_next(input)?;
    let flags = opt(option_flags).parse_next(input)?.unwrap_or_default();

    ws.parse_next(input)?;
    cut_err(':').parse_next(input)?;

    let values: Vec<OptionValue> = cut_err(separated(1.., value_def, (ws, ',')))
        .context(StrContext::Expected(StrContextValue::Description(
            "option values",
        )))
        .parse_next(input)?;

    let mut option = ProductOption::new(key, label.unwrap_or_else(|| key.to_owned()));
    option.values = values;
    if flags.contains(&"required") {
        option = option.required();
    }
    if flags.contains(&"hidden") {
        option = option.hidden();
    }
    Ok(option)
}

// -- Conditions & effects ---------------------------------------------------

fn operator(input: &mut &str) -> ModalResult<Operator> {
    ws.parse_next(input)?;
    alt((
        "==".value(Operator::Equals),
        "!=".value(Operator::NotEquals),
        "not_equals".value(Operator::NotEquals),
        "equals".value(Operator::Equals),
        "contains".value(Operator::Contains),
        "in_list".value(Operator::InList),
        "in".value(Operator::InList),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "operator",
    )))
    .parse_next(input)
}

fn condition(input: &mut &str) -> ModalResult<Condition> {
    ws.parse_next(input)?;
    let key = ident.parse_next(input)?;
    let op = cut_err(operator).parse_next(input)?;
    let test = match op {
        Operator::Equals => Test::Equals(cut_err(value_code).parse_next(input)?),
        Operator::NotEquals => Test::NotEquals(cut_err(value_code).parse_next(input)?),
        Operator::Contains => Test::Contains(cut_err(value_code).parse_next(input)?),
        Operator::InList => Test::InList(cut_err(code_list).parse_next(input)?),
    };
    Ok(Condition {
        option_key: key.to_owned(),
        test,
    })
}

fn action(input: &mut &str) -> ModalResult<Action> {
    ws.parse_next(input)?;
    alt((
        "show_option".value(Action::ShowOption),
        "hide_option".value(Action::HideOption),
        "require_option".value(Action::RequireOption),
        "set_default".value(Action::SetDefault),
        "filter_values".value(Action::FilterValues),
    ))
    .context(StrContext::Expected(StrContextValue::Description("action")))
    .parse_next(input)
}

fn effect(input: &mut &str) -> ModalResult<Effect> {
    let action = action.parse_next(input)?;
    ws.parse_next(input)?;
    let target = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "target option",
        )))
        .parse_next(input)?
        .to_owned();

    Ok(match action {
        Action::ShowOption => Effect::ShowOption { target },
        Action::HideOption => Effect::HideOption { target },
        Action::RequireOption => Effect::RequireOption { target },
        Action::SetDefault => {
            let value = cut_err(value_code).parse_next(input)?;
            Effect::SetDefault { target, value }
        }
        Action::FilterValues => {
            let values = cut_err(alt((code_list, value_code.map(|c| vec![c])))).parse_next(input)?;
            Effect::FilterValues { target, values }
        }
    })
}

// -- Rule definitions -------------------------------------------------------

fn rule_def(input: &mut &str) -> ModalResult<Rule> {
    ws.parse_next(input)?;
    "rule".parse_next(input)?;
    ws.parse_next(input)?;

    let id = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule id",
        )))
        .parse_next(input)?;

    let description = opt(preceded(ws, string_literal)).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err(':').parse_next(input)?;

    ws.parse_next(input)?;
    cut_err("when")
        .context(StrContext::Expected(StrContextValue::StringLiteral("when")))
        .parse_next(input)?;
    let condition = cut_err(condition)
        .context(StrContext::Expected(StrContextValue::Description(
            "condition",
        )))
        .parse_next(input)?;

    ws.parse_next(input)?;
    cut_err("then")
        .context(StrContext::Expected(StrContextValue::StringLiteral("then")))
        .parse_next(input)?;
    let effect = cut_err(effect).parse_next(input)?;

    Ok(Rule {
        id: id.to_owned(),
        condition,
        effect,
        description,
    })
}

// -- Top-level parser -------------------------------------------------------

enum Entry {
    Option(ProductOption),
    Rule(Rule),
}

pub fn parse_catalog(input: &mut &str) -> ModalResult<ParsedCatalog> {
    let entries: Vec<Entry> = repeat(
        0..,
        alt((option_def.map(Entry::Option), rule_def.map(Entry::Rule))),
    )
    .parse_next(input)?;

    ws.parse_next(input)?;

    let mut parsed = ParsedCatalog::default();
    for entry in entries {
        match entry {
            Entry::Option(option) => parsed.options.push(option),
            Entry::Rule(rule) => parsed.rules.push(rule),
        }
    }
    Ok(parsed)
}
