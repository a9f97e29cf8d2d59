//! Declaration parser for C++ headers.
//!
//! A tolerant recursive-descent parser over preprocessed tokens. It only
//! understands declarations: function bodies, initializers and anything it
//! does not recognize are skipped up to the next `;` or balanced `}`.

use std::collections::HashMap;
use std::path::PathBuf;

use reflectgen_foundation::Severity;

use crate::decl::{
    Access, AnnotationToken, AnnotationTokenKind, Decl, DeclKind, FrontendDiagnostic,
    FunctionDecl, FunctionRole, MacroInvocation, ParamDecl, RecordTag, SourceRange,
    TemplateParamDecl, TemplateParamKind,
};
use crate::eval;
use crate::lexer::Lexer;
use crate::pp::{self, Defines};
use crate::spelling::{spell, split_template_args, split_top_level};
use crate::token::{Span, Token, TokenKind};

/// Declarations, annotations and diagnostics of one file.
#[derive(Debug, Default)]
pub struct ParsedFile {
    /// Top-level declarations in source order.
    pub declarations: Vec<Decl>,
    /// Macro invocations at declaration level.
    pub annotations: Vec<MacroInvocation>,
    /// Problems found while parsing.
    pub diagnostics: Vec<FrontendDiagnostic>,
}

/// Lexes, preprocesses (without includes) and parses `source`.
#[must_use]
pub fn parse_source(path: impl Into<PathBuf>, source: &str) -> ParsedFile {
    let path = path.into();
    let mut defines = Defines::new();
    let pre = pp::preprocess(Lexer::tokenize_all(source), &mut defines, &mut |_, _| {});
    let mut parsed = HeaderParser::new(path.clone(), pre.tokens).parse();
    let pass_diagnostics = pre
        .diagnostics
        .into_iter()
        .map(|d| FrontendDiagnostic::new(d.severity, d.message, &path, d.line));
    parsed.diagnostics.splice(0..0, pass_diagnostics);
    parsed
}

#[derive(Clone, Copy)]
struct Scope<'s> {
    record: Option<(&'s str, RecordTag)>,
    braced: bool,
    open_line: u32,
}

struct Pending {
    start: Span,
    template: Option<Vec<TemplateParamDecl>>,
}

struct Collected {
    tokens: Vec<Token>,
    end_line: u32,
}

/// Parser over the preprocessed tokens of one file.
pub struct HeaderParser {
    path: PathBuf,
    /// Preprocessed stream including comments.
    raw: Vec<Token>,
    /// Significant tokens, ending with `Eof`.
    tokens: Vec<Token>,
    /// Position of each significant token in `raw`.
    raw_index: Vec<usize>,
    pos: usize,
    enumerators: HashMap<String, i128>,
    annotations: Vec<MacroInvocation>,
    diagnostics: Vec<FrontendDiagnostic>,
}

impl HeaderParser {
    /// Creates a parser over preprocessed tokens.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, raw: Vec<Token>) -> Self {
        let mut tokens = Vec::with_capacity(raw.len());
        let mut raw_index = Vec::with_capacity(raw.len());
        for (i, token) in raw.iter().enumerate() {
            if !matches!(
                token.kind,
                TokenKind::Comment(_) | TokenKind::Directive(_) | TokenKind::Error(_)
            ) {
                tokens.push(token.clone());
                raw_index.push(i);
            }
        }
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let line = raw.last().map_or(1, Token::line);
            tokens.push(Token::new(TokenKind::Eof, Span::new(0, 0, line, 1)));
            raw_index.push(raw.len());
        }
        Self {
            path: path.into(),
            raw,
            tokens,
            raw_index,
            pos: 0,
            enumerators: HashMap::new(),
            annotations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Parses the whole file.
    #[must_use]
    pub fn parse(mut self) -> ParsedFile {
        let mut declarations = Vec::new();
        let scope = Scope {
            record: None,
            braced: false,
            open_line: 1,
        };
        self.parse_members(scope, &mut declarations);
        ParsedFile {
            declarations,
            annotations: self.annotations,
            diagnostics: self.diagnostics,
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.peek().is_punct(punct) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn report(&mut self, severity: Severity, line: u32, message: impl Into<String>) {
        self.diagnostics
            .push(FrontendDiagnostic::new(severity, message, &self.path, line));
    }

    fn range(&self, start: Span, end_line: u32) -> SourceRange {
        SourceRange {
            path: self.path.clone(),
            start_line: start.line,
            end_line: end_line.max(start.line),
            column: start.column,
            offset: start.start,
        }
    }

    /// Consumes a bracketed group starting at the current opener.
    fn take_group(&mut self) -> Vec<Token> {
        let open = self.bump();
        let mut group = vec![open.clone()];
        let mut depth = 1usize;
        while depth > 0 {
            if self.at_eof() {
                self.report(
                    Severity::Error,
                    open.line(),
                    format!("unbalanced '{}'", open.spelling()),
                );
                break;
            }
            let token = self.bump();
            if is_opener(&token) {
                depth += 1;
            } else if is_closer(&token) {
                depth -= 1;
            }
            group.push(token);
        }
        group
    }

    /// Consumes `<...>` and returns it spelled, e.g. `<int, 3>`.
    fn take_angle_group(&mut self) -> String {
        self.bump();
        let mut inner = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => {
                    let message = "unterminated template argument list";
                    self.report(Severity::Error, token.line(), message);
                    break;
                }
                TokenKind::Punct(">") if depth == 0 => {
                    self.bump();
                    break;
                }
                TokenKind::Punct("(" | "[" | "{") => inner.extend(self.take_group()),
                TokenKind::Punct(p) => {
                    match *p {
                        "<" => depth += 1,
                        ">" => depth -= 1,
                        _ => {}
                    }
                    inner.push(self.bump());
                }
                _ => inner.push(self.bump()),
            }
        }
        format!("<{}>", split_top_level(&spell(&inner)).join(", "))
    }

    fn skip_attributes(&mut self) {
        loop {
            let token = self.peek();
            if token.is_punct("[") && self.peek_at(1).is_punct("[") {
                self.take_group();
            } else if (token.is_ident("__attribute__")
                || token.is_ident("__declspec")
                || token.is_keyword("alignas"))
                && self.peek_at(1).is_punct("(")
            {
                self.bump();
                self.take_group();
            } else {
                return;
            }
        }
    }

    /// Parses declarations until the scope closes; returns the closing line.
    fn parse_members(&mut self, scope: Scope<'_>, out: &mut Vec<Decl>) -> u32 {
        let mut access = scope
            .record
            .map_or(Access::Public, |(_, tag)| tag.default_access());
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => {
                    if scope.braced {
                        self.report(
                            Severity::Error,
                            scope.open_line,
                            "expected '}' to close the scope opened here",
                        );
                    }
                    return token.line();
                }
                TokenKind::Punct("}") => {
                    self.bump();
                    if scope.braced {
                        return token.line();
                    }
                    self.report(Severity::Error, token.line(), "unbalanced '}'");
                }
                TokenKind::Punct(";") => {
                    self.bump();
                }
                TokenKind::Punct(p @ (")" | "]")) => {
                    self.bump();
                    self.report(Severity::Error, token.line(), format!("unbalanced '{p}'"));
                }
                TokenKind::Keyword(k)
                    if scope.record.is_some()
                        && self.peek_at(1).is_punct(":")
                        && access_label(k).is_some() =>
                {
                    access = access_label(k).unwrap_or(access);
                    self.bump();
                    self.bump();
                }
                _ => {
                    let before = self.pos;
                    self.parse_declaration(scope, access, out);
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
    }

    fn parse_declaration(&mut self, scope: Scope<'_>, access: Access, out: &mut Vec<Decl>) {
        let start = self.peek().span;
        self.skip_attributes();
        let pending = Pending {
            start,
            template: None,
        };
        self.parse_declaration_with(scope, access, pending, out);
    }

    fn parse_declaration_with(
        &mut self,
        scope: Scope<'_>,
        access: Access,
        pending: Pending,
        out: &mut Vec<Decl>,
    ) {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Ident(name)
                if is_macro_name(name) && scope.record.is_none_or(|(r, _)| r != name.as_str()) =>
            {
                let next = self.peek_at(1);
                let invocation = next.is_punct("(")
                    || next.line() > token.line()
                    || next.is_punct(";")
                    || next.is_punct("}")
                    || next.kind == TokenKind::Eof;
                let before_tag = ["class", "struct", "union", "enum"]
                    .iter()
                    .any(|k| next.is_keyword(k));
                if invocation {
                    self.parse_macro_invocation();
                } else if before_tag {
                    self.bump();
                    self.parse_declaration_with(scope, access, pending, out);
                } else {
                    self.parse_generic(scope, access, pending, out);
                }
            }
            TokenKind::Keyword(k) => match k.as_str() {
                "namespace" => self.parse_namespace(false, out),
                "inline" if self.peek_at(1).is_keyword("namespace") => {
                    self.bump();
                    self.parse_namespace(true, out);
                }
                "extern" if matches!(self.peek_at(1).kind, TokenKind::Str(_)) => {
                    self.parse_linkage(scope, access, out);
                }
                "extern" if self.peek_at(1).is_keyword("template") => self.skip_declaration(),
                "template" => self.parse_template(scope, access, pending, out),
                "using" | "typedef" | "static_assert" | "friend" => self.skip_declaration(),
                "enum" => self.parse_enum(scope, access, pending, out),
                "class" | "struct" | "union" => self.parse_record(scope, access, pending, out),
                _ => self.parse_generic(scope, access, pending, out),
            },
            _ => self.parse_generic(scope, access, pending, out),
        }
    }

    fn parse_macro_invocation(&mut self) {
        let start = self.pos;
        let name = self.bump();
        if self.peek().is_punct("(") {
            self.take_group();
        }
        let first = self.raw_index[start];
        let last = self.raw_index[self.pos.max(start + 1) - 1];
        let tokens = annotation_tokens(&self.raw[first..=last.min(self.raw.len() - 1)]);
        self.annotations.push(MacroInvocation {
            name: name.spelling().to_string(),
            path: self.path.clone(),
            line: name.line(),
            tokens,
        });
    }

    fn parse_namespace(&mut self, inline: bool, out: &mut Vec<Decl>) {
        let keyword = self.bump();
        let mut names = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Ident(name) => {
                    names.push(name.clone());
                    self.bump();
                }
                TokenKind::Keyword(k) if k == "inline" => {
                    self.bump();
                }
                TokenKind::Punct("::") => {
                    self.bump();
                }
                _ => break,
            }
        }
        if self.eat_punct("=") {
            self.skip_declaration();
            return;
        }
        self.skip_attributes();
        if !self.peek().is_punct("{") {
            self.report(Severity::Error, keyword.line(), "expected '{' after namespace name");
            self.skip_declaration();
            return;
        }
        let open = self.bump();
        let mut children = Vec::new();
        let close = self.parse_members(
            Scope {
                record: None,
                braced: true,
                open_line: open.line(),
            },
            &mut children,
        );
        if names.is_empty() || inline {
            out.extend(children);
            return;
        }
        let location = self.range(keyword.span, close);
        for name in names.into_iter().rev() {
            let mut namespace = Decl::new(DeclKind::Namespace, name, location.clone());
            namespace.children = children;
            children = vec![namespace];
        }
        out.extend(children);
    }

    fn parse_linkage(&mut self, scope: Scope<'_>, access: Access, out: &mut Vec<Decl>) {
        self.bump();
        self.bump();
        if self.peek().is_punct("{") {
            let open = self.bump();
            self.parse_members(
                Scope {
                    record: scope.record,
                    braced: true,
                    open_line: open.line(),
                },
                out,
            );
        } else {
            self.parse_declaration(scope, access, out);
        }
    }

    fn parse_template(
        &mut self,
        scope: Scope<'_>,
        access: Access,
        pending: Pending,
        out: &mut Vec<Decl>,
    ) {
        self.bump();
        if !self.peek().is_punct("<") {
            self.parse_explicit_instantiation(&pending, out);
            return;
        }
        let params = self.parse_template_params();
        self.skip_attributes();
        let pending = Pending {
            start: pending.start,
            // `template <>` introduces an explicit specialization
            template: (!params.is_empty()).then_some(params),
        };
        self.parse_declaration_with(scope, access, pending, out);
    }

    fn parse_template_params(&mut self) -> Vec<TemplateParamDecl> {
        self.bump();
        let mut groups: Vec<Vec<Token>> = vec![Vec::new()];
        let mut depth = 0usize;
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => {
                    let message = "unterminated template parameter list";
                    self.report(Severity::Error, token.line(), message);
                    break;
                }
                TokenKind::Punct(">") if depth == 0 => {
                    self.bump();
                    break;
                }
                TokenKind::Punct(",") if depth == 0 => {
                    self.bump();
                    groups.push(Vec::new());
                }
                TokenKind::Punct("(" | "[" | "{") => {
                    let group = self.take_group();
                    if let Some(last) = groups.last_mut() {
                        last.extend(group);
                    }
                }
                kind => {
                    if kind == &TokenKind::Punct("<") {
                        depth += 1;
                    } else if kind == &TokenKind::Punct(">") {
                        depth -= 1;
                    }
                    let token = self.bump();
                    if let Some(last) = groups.last_mut() {
                        last.push(token);
                    }
                }
            }
        }
        groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|g| template_param(&g))
            .collect()
    }

    fn parse_explicit_instantiation(&mut self, pending: &Pending, out: &mut Vec<Decl>) {
        let collected = self.collect_declaration();
        let tokens = strip_attributes(&collected.tokens);
        let Some(first) = tokens.first() else {
            return;
        };
        let instantiation = if ["class", "struct", "union"].iter().any(|k| first.is_keyword(k)) {
            split_template_args(&spell(&tokens[1..])).map(|u| (u.name, u.args, false))
        } else {
            explicit_function_instantiation(&tokens)
        };
        let Some((template_name, args, is_function)) = instantiation else {
            self.report(
                Severity::Warning,
                pending.start.line,
                "explicit instantiation without template arguments is ignored",
            );
            return;
        };
        let template_name = template_name.trim_start_matches("::").to_string();
        let name = format!("{template_name}<{}>", args.join(", "));
        out.push(Decl::new(
            DeclKind::ExplicitInstantiation {
                template_name,
                args,
                is_function,
            },
            name,
            self.range(pending.start, collected.end_line),
        ));
    }

    /// Gathers one declaration up to `;` or through a function body.
    ///
    /// Bodies are dropped; brace initializers are kept.
    fn collect_declaration(&mut self) -> Collected {
        let mut tokens: Vec<Token> = Vec::new();
        let mut end_line = self.peek().line();
        let mut saw_params = false;
        let mut in_init_list = false;
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof | TokenKind::Punct("}") => break,
                TokenKind::Punct(";") => {
                    self.bump();
                    end_line = token.line();
                    break;
                }
                TokenKind::Punct(p @ (")" | "]")) => {
                    self.bump();
                    self.report(Severity::Error, token.line(), format!("unbalanced '{p}'"));
                }
                TokenKind::Punct("(" | "[") => {
                    if token.is_punct("(")
                        && !in_init_list
                        && tokens
                            .last()
                            .is_some_and(|t| t.kind.is_word() || t.is_punct(">"))
                    {
                        saw_params = true;
                    }
                    let group = self.take_group();
                    end_line = group.last().map_or(end_line, Token::line);
                    tokens.extend(group);
                }
                TokenKind::Punct("{") => {
                    let prev = tokens.last();
                    let after_assign = prev.is_some_and(|t| t.is_punct("="));
                    let is_body = saw_params
                        && !after_assign
                        && (!in_init_list
                            || prev.is_some_and(|t| t.is_punct(")") || t.is_punct("}")));
                    let group = self.take_group();
                    end_line = group.last().map_or(end_line, Token::line);
                    if is_body {
                        break;
                    }
                    tokens.extend(group);
                }
                TokenKind::Punct(":")
                    if saw_params
                        && !in_init_list
                        && tokens
                            .last()
                            .is_some_and(|t| t.is_punct(")") || t.kind.is_word()) =>
                {
                    in_init_list = true;
                    tokens.push(self.bump());
                }
                _ => {
                    end_line = token.line();
                    tokens.push(self.bump());
                }
            }
        }
        Collected { tokens, end_line }
    }

    fn skip_declaration(&mut self) {
        self.collect_declaration();
    }

    /// Looks ahead for a `{` that opens a definition body.
    fn definition_ahead(&self) -> bool {
        let mut i = self.pos + 1;
        while let Some(token) = self.tokens.get(i) {
            match &token.kind {
                TokenKind::Punct("{") => return true,
                TokenKind::Punct(";" | "=" | "}" | ")") | TokenKind::Eof => return false,
                TokenKind::Punct("(" | "[") => {
                    let prev = &self.tokens[i - 1];
                    let attribute = token.is_punct("[")
                        || prev.is_ident("__declspec")
                        || prev.is_ident("__attribute__")
                        || prev.is_keyword("alignas")
                        || prev.ident().is_some_and(is_macro_name);
                    if !attribute {
                        return false;
                    }
                    i = close_index(&self.tokens, i);
                }
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_record(
        &mut self,
        scope: Scope<'_>,
        access: Access,
        pending: Pending,
        out: &mut Vec<Decl>,
    ) {
        if !self.definition_ahead() {
            self.parse_generic(scope, access, pending, out);
            return;
        }
        let key = self.bump();
        let tag = if key.is_keyword("class") {
            RecordTag::Class
        } else {
            RecordTag::Struct
        };
        self.skip_attributes();

        let mut name = String::new();
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Ident(ident)
                    if ident == "final"
                        && (self.peek_at(1).is_punct(":") || self.peek_at(1).is_punct("{")) =>
                {
                    self.bump();
                    break;
                }
                TokenKind::Ident(ident) => {
                    name.clone_from(ident);
                    self.bump();
                }
                TokenKind::Punct("::") | TokenKind::Keyword(_) => {
                    self.bump();
                }
                TokenKind::Punct("<") => {
                    let args = self.take_angle_group();
                    name.push_str(&args);
                }
                TokenKind::Punct("(" | "[") => {
                    self.take_group();
                }
                _ => break,
            }
        }

        let mut children = Vec::new();
        if self.eat_punct(":") {
            self.parse_bases(tag, &mut children);
        }
        if !self.peek().is_punct("{") {
            self.report(Severity::Error, key.line(), "expected '{' to open record body");
            self.skip_declaration();
            return;
        }
        let open = self.bump();
        let close = self.parse_members(
            Scope {
                record: Some((name.as_str(), tag)),
                braced: true,
                open_line: open.line(),
            },
            &mut children,
        );
        if !self.eat_punct(";") {
            self.skip_declaration();
        }
        if name.is_empty() {
            return;
        }
        let is_abstract = children
            .iter()
            .any(|c| matches!(&c.kind, DeclKind::Function(f) if f.is_pure));
        let mut record = Decl::new(
            DeclKind::Record {
                tag,
                is_abstract,
                template: pending.template,
            },
            name,
            self.range(pending.start, close),
        )
        .with_access(access);
        record.children = children;
        out.push(record);
    }

    fn parse_bases(&mut self, tag: RecordTag, out: &mut Vec<Decl>) {
        loop {
            let start = self.peek().span;
            let mut tokens = Vec::new();
            let mut depth = 0usize;
            loop {
                let token = self.peek().clone();
                match &token.kind {
                    TokenKind::Eof => break,
                    TokenKind::Punct("{" | ",") if depth == 0 => break,
                    TokenKind::Punct("(") => tokens.extend(self.take_group()),
                    TokenKind::Punct(p) => {
                        match *p {
                            "<" => depth += 1,
                            ">" => depth = depth.saturating_sub(1),
                            _ => {}
                        }
                        tokens.push(self.bump());
                    }
                    _ => tokens.push(self.bump()),
                }
            }

            let mut is_virtual = false;
            let mut access = tag.default_access();
            let mut i = 0;
            while let Some(token) = tokens.get(i) {
                if token.is_keyword("virtual") {
                    is_virtual = true;
                } else if token.is_keyword("public") {
                    access = Access::Public;
                } else if token.is_keyword("protected") {
                    access = Access::Protected;
                } else if token.is_keyword("private") {
                    access = Access::Private;
                } else {
                    break;
                }
                i += 1;
            }
            let spelled = spell(&tokens[i..]);
            let base = spelled.trim_start_matches("::");
            if !base.is_empty() {
                out.push(
                    Decl::new(
                        DeclKind::BaseSpecifier { access, is_virtual },
                        base,
                        self.range(start, start.line),
                    )
                    .with_access(access),
                );
            }
            if !self.eat_punct(",") {
                return;
            }
        }
    }

    fn parse_enum(
        &mut self,
        scope: Scope<'_>,
        access: Access,
        pending: Pending,
        out: &mut Vec<Decl>,
    ) {
        if !self.definition_ahead() {
            self.parse_generic(scope, access, pending, out);
            return;
        }
        self.bump();
        let is_scoped = self.peek().is_keyword("class") || self.peek().is_keyword("struct");
        if is_scoped {
            self.bump();
        }
        self.skip_attributes();
        let mut name = String::new();
        loop {
            match &self.peek().kind {
                TokenKind::Ident(ident) => {
                    name.clone_from(ident);
                    self.bump();
                }
                TokenKind::Punct("::") => {
                    self.bump();
                }
                _ => break,
            }
        }
        if self.eat_punct(":") {
            while !self.peek().is_punct("{") && !self.at_eof() {
                self.bump();
            }
        }
        let open = self.bump();

        let mut constants = Vec::new();
        let mut next_value: i128 = 0;
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Punct("}") => break,
                TokenKind::Eof => {
                    self.report(Severity::Error, open.line(), "expected '}' to close enum body");
                    break;
                }
                TokenKind::Punct(",") => {
                    self.bump();
                }
                TokenKind::Ident(enumerator) => {
                    self.bump();
                    self.skip_attributes();
                    let value = if self.eat_punct("=") {
                        let expr = self.collect_enumerator_value();
                        let evaluated =
                            eval::evaluate(&expr, &|id: &str| self.enumerators.get(id).copied());
                        if let Some(value) = evaluated {
                            value
                        } else {
                            self.report(
                                Severity::Warning,
                                token.line(),
                                format!(
                                    "cannot evaluate value of enumerator {enumerator}, \
                                     using {next_value}"
                                ),
                            );
                            next_value
                        }
                    } else {
                        next_value
                    };
                    next_value = value.wrapping_add(1);
                    self.enumerators.insert(enumerator.clone(), value);
                    if !name.is_empty() {
                        self.enumerators.insert(format!("{name}::{enumerator}"), value);
                    }
                    constants.push(Decl::new(
                        DeclKind::EnumConstant {
                            value: to_bits(value),
                        },
                        enumerator.clone(),
                        self.range(token.span, token.line()),
                    ));
                }
                _ => {
                    self.report(Severity::Error, token.line(), "unexpected token in enum body");
                    self.bump();
                }
            }
        }
        let close = self.bump();
        if !self.eat_punct(";") {
            self.skip_declaration();
        }
        if name.is_empty() {
            return;
        }
        let mut decl = Decl::new(
            DeclKind::Enum { is_scoped },
            name,
            self.range(pending.start, close.line()),
        )
        .with_access(access);
        decl.children = constants;
        out.push(decl);
    }

    fn collect_enumerator_value(&mut self) -> Vec<Token> {
        let mut expr = Vec::new();
        loop {
            let token = self.peek();
            if token.is_punct(",") || token.is_punct("}") || token.kind == TokenKind::Eof {
                return expr;
            }
            if is_opener(token) {
                expr.extend(self.take_group());
            } else {
                expr.push(self.bump());
            }
        }
    }

    fn parse_generic(
        &mut self,
        scope: Scope<'_>,
        access: Access,
        pending: Pending,
        out: &mut Vec<Decl>,
    ) {
        let collected = self.collect_declaration();
        let tokens = strip_attributes(&collected.tokens);

        let mut is_static = false;
        let mut is_virtual = false;
        let mut i = 0;
        while let Some(token) = tokens.get(i) {
            match &token.kind {
                TokenKind::Keyword(k) => match k.as_str() {
                    "static" => is_static = true,
                    "virtual" => is_virtual = true,
                    "inline" | "constexpr" | "consteval" | "constinit" | "mutable" | "extern"
                    | "thread_local" | "register" => {}
                    "explicit" => {
                        if tokens.get(i + 1).is_some_and(|t| t.is_punct("(")) {
                            i = close_index(&tokens, i + 1);
                        }
                    }
                    "friend" => return,
                    _ => break,
                },
                TokenKind::Ident(name)
                    if is_macro_name(name)
                        && tokens.get(i + 1).is_some_and(|t| t.kind.is_word())
                        && tokens.len() > i + 2 => {}
                _ => break,
            }
            i += 1;
        }
        let tokens = &tokens[i..];
        if tokens.is_empty() {
            return;
        }

        let stop = top_level(tokens, &["(", "=", ",", ":", "[", "{"]).first().copied();
        match stop {
            Some(p) if tokens[p].is_punct("(") => {
                let traits = FunctionTraits {
                    is_static,
                    is_virtual,
                };
                let end_line = collected.end_line;
                if let Some(decl) =
                    self.function(scope, access, pending, tokens, p, traits, end_line)
                {
                    out.push(decl);
                }
            }
            _ if pending.template.is_none() => {
                self.variables(
                    scope,
                    access,
                    pending.start,
                    tokens,
                    is_static,
                    collected.end_line,
                    out,
                );
            }
            _ => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn function(
        &mut self,
        scope: Scope<'_>,
        access: Access,
        pending: Pending,
        tokens: &[Token],
        paren: usize,
        traits: FunctionTraits,
        end_line: u32,
    ) -> Option<Decl> {
        let mut paren = paren;
        let mut is_operator = false;
        let operator = tokens[..paren].iter().position(|t| t.is_keyword("operator"));
        let (name, name_start) = if let Some(op) = operator {
            if paren == op + 1 && tokens.get(op + 2).is_some_and(|t| t.is_punct(")")) {
                paren = op + 3;
                if !tokens.get(paren).is_some_and(|t| t.is_punct("(")) {
                    return None;
                }
            }
            is_operator = true;
            (operator_name(&tokens[op + 1..paren]), op)
        } else {
            let n = paren.checked_sub(1)?;
            (tokens[n].ident()?.to_string(), n)
        };

        let is_destructor = name_start > 0 && tokens[name_start - 1].is_punct("~");
        let type_end = if is_destructor { name_start - 1 } else { name_start };
        if type_end > 0 && tokens[type_end - 1].is_punct("::") {
            // out-of-line member definition
            return None;
        }
        let return_tokens = &tokens[..type_end];
        let is_constructor = !is_destructor
            && !is_operator
            && return_tokens.is_empty()
            && scope.record.is_some_and(|(record, _)| record == name);
        if return_tokens.is_empty() && !is_constructor && !is_destructor && !is_operator {
            return None;
        }

        let role = if is_constructor {
            FunctionRole::Constructor
        } else if is_destructor {
            FunctionRole::Destructor
        } else if scope.record.is_some() {
            if traits.is_static {
                FunctionRole::StaticMethod
            } else {
                FunctionRole::Method
            }
        } else {
            FunctionRole::Free
        };

        let Some(close) = matching_close(tokens, paren) else {
            self.report(
                Severity::Error,
                tokens[paren].line(),
                format!("unterminated parameter list of '{name}'"),
            );
            return None;
        };
        let mut function = FunctionDecl::new(role, spell(return_tokens));
        function.params = params(&tokens[paren + 1..close]);
        function.is_virtual = traits.is_virtual;
        function.is_operator = is_operator;

        let mut j = close + 1;
        while let Some(token) = tokens.get(j) {
            match &token.kind {
                TokenKind::Keyword(k) if k == "const" => function.is_const = true,
                TokenKind::Keyword(k) if k == "noexcept" || k == "throw" => {
                    if tokens.get(j + 1).is_some_and(|t| t.is_punct("(")) {
                        j = close_index(tokens, j + 1);
                    }
                }
                TokenKind::Ident(i) if i == "override" || i == "final" => {
                    function.is_virtual = true;
                }
                TokenKind::Punct("->") => {
                    let end = tokens[j + 1..]
                        .iter()
                        .position(|t| {
                            t.is_punct("=")
                                || t.is_punct(":")
                                || t.is_ident("override")
                                || t.is_ident("final")
                        })
                        .map_or(tokens.len(), |k| j + 1 + k);
                    if function.return_type == "auto" {
                        function.return_type = spell(&tokens[j + 1..end]);
                    }
                    j = end;
                    continue;
                }
                TokenKind::Punct("=") => {
                    match tokens.get(j + 1).map(|t| &t.kind) {
                        Some(TokenKind::Number(n)) if n == "0" => function.is_pure = true,
                        Some(TokenKind::Keyword(k)) if k == "delete" => function.is_deleted = true,
                        _ => {}
                    }
                    j += 2;
                    continue;
                }
                TokenKind::Punct(":") => break,
                _ => {}
            }
            j += 1;
        }

        function.template = pending.template;
        function.usr = function.signature(&name);
        let display_name = if is_destructor { format!("~{name}") } else { name };
        Some(
            Decl::new(
                DeclKind::Function(function),
                display_name,
                self.range(pending.start, end_line),
            )
            .with_access(access),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn variables(
        &self,
        scope: Scope<'_>,
        access: Access,
        start: Span,
        tokens: &[Token],
        is_static: bool,
        end_line: u32,
        out: &mut Vec<Decl>,
    ) {
        let declarators = split_top(tokens, ",");
        let Some(first) = declarators.first() else {
            return;
        };
        let Some((name_idx, stop)) = declarator_name(first) else {
            return;
        };
        let type_tokens = &first[..name_idx];
        if !has_type_word(type_tokens) {
            return;
        }
        let base_len = top_level(type_tokens, &["*", "&", "&&"])
            .first()
            .copied()
            .unwrap_or(type_tokens.len());
        let base = &type_tokens[..base_len];
        let is_member = scope.record.is_some();

        let mut push = |name: &str, ty: String| {
            out.push(
                Decl::new(
                    DeclKind::Variable {
                        ty,
                        is_member,
                        is_static,
                    },
                    name,
                    self.range(start, end_line),
                )
                .with_access(access),
            );
        };

        let first_type: Vec<Token> = type_tokens
            .iter()
            .chain(array_suffix(first, stop))
            .cloned()
            .collect();
        push(first[name_idx].spelling(), spell(&first_type));

        for declarator in &declarators[1..] {
            let Some((idx, stop)) = declarator_name(declarator) else {
                continue;
            };
            let ty: Vec<Token> = base
                .iter()
                .chain(&declarator[..idx])
                .chain(array_suffix(declarator, stop))
                .cloned()
                .collect();
            push(declarator[idx].spelling(), spell(&ty));
        }
    }
}

#[derive(Clone, Copy)]
struct FunctionTraits {
    is_static: bool,
    is_virtual: bool,
}

/// Returns true for all-caps identifiers such as `TCLASS` or `DLL_EXPORT`.
#[must_use]
pub fn is_macro_name(name: &str) -> bool {
    name.len() >= 2
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && name.chars().any(|c| c.is_ascii_uppercase())
}

/// Classifies raw tokens of a macro invocation.
#[must_use]
pub fn annotation_tokens(raw: &[Token]) -> Vec<AnnotationToken> {
    raw.iter()
        .filter_map(|token| {
            let kind = match &token.kind {
                TokenKind::Punct(_) => AnnotationTokenKind::Punctuation,
                TokenKind::Ident(_) => AnnotationTokenKind::Identifier,
                TokenKind::Keyword(_) => AnnotationTokenKind::Keyword,
                TokenKind::Number(_) | TokenKind::Str(_) | TokenKind::Char(_) => {
                    AnnotationTokenKind::Literal
                }
                TokenKind::Comment(_) => AnnotationTokenKind::Comment,
                TokenKind::Directive(_) | TokenKind::Eof | TokenKind::Error(_) => return None,
            };
            Some(AnnotationToken::new(kind, token.spelling()))
        })
        .collect()
}

fn access_label(keyword: &str) -> Option<Access> {
    match keyword {
        "public" => Some(Access::Public),
        "protected" => Some(Access::Protected),
        "private" => Some(Access::Private),
        _ => None,
    }
}

fn is_opener(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Punct("(" | "[" | "{"))
}

fn is_closer(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Punct(")" | "]" | "}"))
}

/// Index of the closer matching the opener at `open`, if the group is closed.
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if is_opener(token) {
            depth += 1;
        } else if is_closer(token) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Like [`matching_close`], but falls back to the last index.
fn close_index(tokens: &[Token], open: usize) -> usize {
    matching_close(tokens, open).unwrap_or_else(|| tokens.len().saturating_sub(1))
}

/// Indices of the given punctuators outside any bracket or template nesting.
fn top_level(tokens: &[Token], set: &[&str]) -> Vec<usize> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut angle = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if depth == 0 && angle == 0 && set.iter().any(|p| token.is_punct(p)) {
            found.push(i);
        }
        match &token.kind {
            TokenKind::Punct("(" | "[" | "{") => depth += 1,
            TokenKind::Punct(")" | "]" | "}") => depth = depth.saturating_sub(1),
            TokenKind::Punct("<")
                if depth == 0
                    && i > 0
                    && (tokens[i - 1].ident().is_some() || tokens[i - 1].is_keyword("template")) =>
            {
                angle += 1;
            }
            TokenKind::Punct(">") if depth == 0 && angle > 0 => angle -= 1,
            _ => {}
        }
    }
    found
}

fn split_top<'t>(tokens: &'t [Token], sep: &str) -> Vec<&'t [Token]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for at in top_level(tokens, &[sep]) {
        parts.push(&tokens[start..at]);
        start = at + 1;
    }
    parts.push(&tokens[start..]);
    parts
}

fn strip_attributes(tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while let Some(token) = tokens.get(i) {
        let next_is = |p: &str| tokens.get(i + 1).is_some_and(|t| t.is_punct(p));
        if token.is_punct("[") && next_is("[") {
            i = close_index(tokens, i) + 1;
            continue;
        }
        if (token.is_ident("__attribute__")
            || token.is_ident("__declspec")
            || token.is_keyword("alignas"))
            && next_is("(")
        {
            i = close_index(tokens, i + 1) + 1;
            continue;
        }
        out.push(token.clone());
        i += 1;
    }
    out
}

/// True if the tokens name a type rather than only qualify one.
fn has_type_word(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| match &t.kind {
        TokenKind::Ident(_) => true,
        TokenKind::Keyword(k) => !matches!(
            k.as_str(),
            "const" | "volatile" | "struct" | "class" | "enum" | "union" | "typename"
        ),
        _ => false,
    })
}

/// Finds the declared name in a declarator: index of the name and of the
/// first token after it.
fn declarator_name(declarator: &[Token]) -> Option<(usize, usize)> {
    let stop = top_level(declarator, &["=", "[", ":", "{"])
        .first()
        .copied()
        .unwrap_or(declarator.len());
    let idx = stop.checked_sub(1)?;
    declarator[idx].ident()?;
    if idx > 0 && declarator[idx - 1].is_punct("::") {
        return None;
    }
    Some((idx, stop))
}

/// Array bounds following the declared name, e.g. `[3][4]`.
fn array_suffix(declarator: &[Token], stop: usize) -> &[Token] {
    if !declarator.get(stop).is_some_and(|t| t.is_punct("[")) {
        return &[];
    }
    let rest = &declarator[stop..];
    let end = top_level(rest, &["=", ":", "{"])
        .first()
        .copied()
        .unwrap_or(rest.len());
    &rest[..end]
}

fn params(tokens: &[Token]) -> Vec<ParamDecl> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let parts = split_top(tokens, ",");
    if parts.len() == 1 && parts[0].len() == 1 && parts[0][0].is_keyword("void") {
        return Vec::new();
    }
    parts
        .into_iter()
        .map(strip_attributes)
        .filter(|part| !part.is_empty())
        .map(|part| param(&part))
        .collect()
}

fn param(part: &[Token]) -> ParamDecl {
    let (declarator, default_value) = match top_level(part, &["="]).first() {
        Some(&eq) => (&part[..eq], Some(spell(&part[eq + 1..]))),
        None => (part, None),
    };
    let bounds = top_level(declarator, &["["])
        .first()
        .copied()
        .unwrap_or(declarator.len());
    let (core, suffix) = declarator.split_at(bounds);
    let named = core.len() >= 2
        && core.last().is_some_and(|t| t.ident().is_some())
        && !core[core.len() - 2].is_punct("::")
        && has_type_word(&core[..core.len() - 1]);
    if named {
        let ty: Vec<Token> = core[..core.len() - 1].iter().chain(suffix).cloned().collect();
        ParamDecl {
            ty: spell(&ty),
            name: core[core.len() - 1].spelling().to_string(),
            default_value,
        }
    } else {
        ParamDecl {
            ty: spell(declarator),
            name: String::new(),
            default_value,
        }
    }
}

fn operator_name(tokens: &[Token]) -> String {
    let mut name = String::from("operator");
    for token in tokens {
        if token.kind.is_word() {
            name.push(' ');
        }
        name.push_str(token.spelling());
    }
    name
}

fn template_param(tokens: &[Token]) -> TemplateParamDecl {
    let (head, default) = match top_level(tokens, &["="]).first() {
        Some(&eq) => (&tokens[..eq], Some(spell(&tokens[eq + 1..]))),
        None => (tokens, None),
    };
    let trailing_name = head
        .last()
        .and_then(Token::ident)
        .filter(|_| head.len() > 1)
        .map(str::to_string);

    if head.first().is_some_and(|t| t.is_keyword("template")) {
        let (name, spelled) = match &trailing_name {
            Some(name) => (name.clone(), spell(&head[..head.len() - 1])),
            None => (String::new(), spell(head)),
        };
        return TemplateParamDecl {
            name,
            kind: TemplateParamKind::TemplateTemplate,
            type_spelling: spelled,
            default,
        };
    }

    let simple_type_param = head
        .first()
        .is_some_and(|t| t.is_keyword("typename") || t.is_keyword("class"))
        && !head.iter().any(|t| t.is_punct("::"));
    if simple_type_param {
        let name = trailing_name.unwrap_or_default();
        return TemplateParamDecl {
            type_spelling: name.clone(),
            name,
            kind: TemplateParamKind::Type,
            default,
        };
    }

    match trailing_name {
        Some(name) => TemplateParamDecl {
            name,
            kind: TemplateParamKind::NonType,
            type_spelling: spell(&head[..head.len() - 1]),
            default,
        },
        None => TemplateParamDecl {
            name: String::new(),
            kind: TemplateParamKind::NonType,
            type_spelling: spell(head),
            default,
        },
    }
}

/// `R name<args>(params)` in an explicit instantiation.
fn explicit_function_instantiation(tokens: &[Token]) -> Option<(String, Vec<String>, bool)> {
    let paren = *top_level(tokens, &["("]).first()?;
    let close_angle = paren.checked_sub(1)?;
    if !tokens[close_angle].is_punct(">") {
        return None;
    }
    let mut depth = 0usize;
    let mut open = None;
    for i in (0..=close_angle).rev() {
        if tokens[i].is_punct(">") {
            depth += 1;
        } else if tokens[i].is_punct("<") {
            depth -= 1;
            if depth == 0 {
                open = Some(i);
                break;
            }
        }
    }
    let open = open?;
    let mut name_start = open.checked_sub(1)?;
    tokens[name_start].ident()?;
    while name_start >= 2
        && tokens[name_start - 1].is_punct("::")
        && tokens[name_start - 2].ident().is_some()
    {
        name_start -= 2;
    }
    let name = spell(&tokens[name_start..open]);
    let args = split_top_level(&spell(&tokens[open + 1..close_angle]));
    Some((name, args, true))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_bits(value: i128) -> u64 {
    value as u64
}
