use crate::language::{errors::SyntaxError, span::Span};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1, multispace1, not_line_ending, satisfy},
    combinator::{not, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::many0,
    sequence::{pair, preceded, terminated},
    IResult, Parser as NomParser,
};

#[derive(Clone, Debug, PartialEq)]
pub enum FormKind {
    Int(i64),
    Str(String),
    Symbol(String),
    Keyword(String),
    List(Vec<Form>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub span: Span,
}

impl Form {
    pub fn new(kind: FormKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn symbol(&self) -> Option<&str> {
        match &self.kind {
            FormKind::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self.kind {
            FormKind::Int(_) => "integer",
            FormKind::Str(_) => "string",
            FormKind::Symbol(_) => "symbol",
            FormKind::Keyword(_) => "keyword",
            FormKind::List(_) => "list",
        }
    }
}

pub fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || "+-*/<>=!?_.&|%^~$".contains(c)
}

/// Reads the next top-level form starting at byte `offset`. Returns the form
/// and the offset just past it, or `None` once only whitespace and comments
/// remain.
pub fn read_form(source: &str, offset: usize) -> Result<Option<(Form, usize)>, SyntaxError> {
    let parser = FormParser { full: source };
    let input = source.get(offset..).unwrap_or("");
    let (input, _) = trivia(input).map_err(|err| parser.error(err))?;
    if input.is_empty() {
        return Ok(None);
    }
    match parser.form(input) {
        Ok((rest, form)) => Ok(Some((form, parser.offset(rest)))),
        Err(err) => Err(parser.error(err)),
    }
}

pub fn read_all(source: &str) -> Result<Vec<Form>, SyntaxError> {
    let mut forms = Vec::new();
    let mut offset = 0;
    while let Some((form, next)) = read_form(source, offset)? {
        forms.push(form);
        offset = next;
    }
    Ok(forms)
}

struct FormParser<'a> {
    full: &'a str,
}

impl<'a> FormParser<'a> {
    fn offset(&self, input: &str) -> usize {
        self.full.len() - input.len()
    }

    fn form(&self, input: &'a str) -> IResult<&'a str, Form> {
        let start = self.offset(input);
        let (rest, kind) = alt((
            |i: &'a str| self.list(i),
            |i: &'a str| self.quoted(i),
            |i: &'a str| string_literal(i).map(|(rest, text)| (rest, FormKind::Str(text))),
            integer,
            keyword,
            symbol,
        ))(input)?;
        Ok((rest, Form::new(kind, Span::new(start, self.offset(rest)))))
    }

    fn list(&self, input: &'a str) -> IResult<&'a str, FormKind> {
        let (mut rest, _) = char('(')(input)?;
        let mut items = Vec::new();
        loop {
            let (after, _) = trivia(rest)?;
            if let Ok((closed, _)) = char::<&str, Error<&str>>(')')(after) {
                return Ok((closed, FormKind::List(items)));
            }
            if after.is_empty() {
                return Err(nom::Err::Failure(Error::new(after, ErrorKind::Char)));
            }
            let (after_item, item) = self.form(after).map_err(to_failure)?;
            items.push(item);
            rest = after_item;
        }
    }

    fn quoted(&self, input: &'a str) -> IResult<&'a str, FormKind> {
        let start = self.offset(input);
        let (rest, _) = char('\'')(input)?;
        let (rest, quoted) = self.form(rest).map_err(to_failure)?;
        let marker = Form::new(
            FormKind::Symbol("quote".to_string()),
            Span::new(start, start + 1),
        );
        Ok((rest, FormKind::List(vec![marker, quoted])))
    }

    fn error(&self, err: nom::Err<Error<&str>>) -> SyntaxError {
        let inner = match err {
            nom::Err::Error(inner) | nom::Err::Failure(inner) => inner,
            nom::Err::Incomplete(_) => Error::new("", ErrorKind::Eof),
        };
        let start = self.offset(inner.input);
        let Some(found) = inner.input.chars().next() else {
            return SyntaxError::new("unexpected end of input", Span::new(start, start))
                .with_label("input ends here")
                .with_help("a list or string is missing its closing delimiter");
        };
        let span = Span::new(start, start + found.len_utf8());
        match inner.code {
            ErrorKind::Digit => SyntaxError::new("integer literal is out of range", span),
            ErrorKind::Escaped => SyntaxError::new("unknown escape sequence in string", span)
                .with_help("supported escapes are \\n \\t \\r \\0 \\\" and \\\\"),
            _ => SyntaxError::new(format!("unexpected `{found}`"), span),
        }
    }
}

fn to_failure<E>(err: nom::Err<E>) -> nom::Err<E> {
    match err {
        nom::Err::Error(inner) => nom::Err::Failure(inner),
        other => other,
    }
}

fn trivia(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), pair(char(';'), not_line_ending)),
        ))),
    )
    .parse(input)
}

fn integer(input: &str) -> IResult<&str, FormKind> {
    let (rest, digits) = terminated(
        recognize(pair(opt(char('-')), digit1)),
        not(satisfy(is_symbol_char)),
    )
    .parse(input)?;
    match digits.parse::<i64>() {
        Ok(number) => Ok((rest, FormKind::Int(number))),
        Err(_) => Err(nom::Err::Failure(Error::new(input, ErrorKind::Digit))),
    }
}

fn keyword(input: &str) -> IResult<&str, FormKind> {
    let (rest, name) = preceded(char(':'), take_while1(is_symbol_char)).parse(input)?;
    Ok((rest, FormKind::Keyword(name.to_string())))
}

fn symbol(input: &str) -> IResult<&str, FormKind> {
    let (rest, name) = take_while1(is_symbol_char)(input)?;
    Ok((rest, FormKind::Symbol(name.to_string())))
}

fn string_literal(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('"')(input)?;
    let mut text = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Char))),
            Some('"') => return Ok((chars.as_str(), text)),
            Some('\\') => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('0') => '\0',
                    Some('"') => '"',
                    Some('\\') => '\\',
                    _ => return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Escaped))),
                };
                text.push(escaped);
                rest = chars.as_str();
            }
            Some(c) => {
                text.push(c);
                rest = chars.as_str();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(form: &Form) -> Vec<String> {
        form.list()
            .expect("list")
            .iter()
            .map(|item| match &item.kind {
                FormKind::Symbol(name) => name.clone(),
                FormKind::Keyword(name) => format!(":{name}"),
                FormKind::Int(value) => value.to_string(),
                FormKind::Str(text) => format!("{text:?}"),
                FormKind::List(_) => "(...)".to_string(),
            })
            .collect()
    }

    #[test]
    fn reads_forms_incrementally_with_offsets() {
        let source = "(val x 1) ; trailing comment\n(print x)";
        let (first, next) = read_form(source, 0).unwrap().unwrap();
        assert_eq!(symbols(&first), vec!["val", "x", "1"]);
        assert_eq!(first.span, Span::new(0, 9));
        let (second, end) = read_form(source, next).unwrap().unwrap();
        assert_eq!(symbols(&second), vec!["print", "x"]);
        assert!(read_form(source, end).unwrap().is_none());
    }

    #[test]
    fn distinguishes_negative_numbers_from_symbols() {
        let forms = read_all("(- -5 x-1 :key \"a\\nb\")").unwrap();
        assert_eq!(symbols(&forms[0]), vec!["-", "-5", "x-1", ":key", "\"a\\nb\""]);
    }

    #[test]
    fn quote_sugar_expands_to_quote_form() {
        let forms = read_all("'(a b)").unwrap();
        let items = forms[0].list().unwrap();
        assert_eq!(items[0].symbol(), Some("quote"));
        assert_eq!(items[1].list().map(|l| l.len()), Some(2));
    }

    #[test]
    fn unterminated_list_reports_end_of_input() {
        let err = read_all("(def foo").unwrap_err();
        assert_eq!(err.message, "unexpected end of input");
        assert_eq!(err.span.start, 8);
        assert!(err.help.is_some());
    }

    #[test]
    fn stray_character_is_reported_where_it_occurs() {
        let err = read_all("(a #b)").unwrap_err();
        assert_eq!(err.message, "unexpected `#`");
        assert_eq!(err.span, Span::new(3, 4));
    }

    #[test]
    fn out_of_range_integer_is_rejected() {
        let err = read_all("99999999999999999999").unwrap_err();
        assert_eq!(err.message, "integer literal is out of range");
    }
}
