use crate::config::EmitterConfig;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

pub type EmitResult = Result<()>;

/// How a piece of text is painted when colors are on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading,
    Keyword,
    Location,
    Warning,
    Error,
    Muted,
}

impl Tone {
    pub fn paint(self, text: &str, use_colors: bool) -> String {
        if !use_colors {
            return text.to_string();
        }
        match self {
            Tone::Plain => text.to_string(),
            Tone::Heading => text.bright_cyan().bold().to_string(),
            Tone::Keyword => text.bright_blue().to_string(),
            Tone::Location => text.magenta().to_string(),
            Tone::Warning => text.yellow().to_string(),
            Tone::Error => text.bright_red().bold().to_string(),
            Tone::Muted => text.dimmed().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmitContext {
    pub indent_level: usize,
    pub indent_chars: String,
    pub use_colors: bool,
}

impl EmitContext {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_chars: "  ".to_string(),
            use_colors: false,
        }
    }

    pub fn from_config(config: &EmitterConfig) -> Self {
        Self {
            indent_level: 0,
            indent_chars: " ".repeat(config.indent),
            use_colors: config.use_colors,
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn get_indent(&self) -> String {
        self.indent_chars.repeat(self.indent_level)
    }

    pub fn nested(&self) -> Self {
        let mut ctx = self.clone();
        ctx.indent();
        ctx
    }
}

impl Default for EmitContext {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Emitter {
    type Item;

    fn config(&self) -> &EmitterConfig;

    fn emit<W: Write>(
        &self,
        item: &Self::Item,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult;

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::from_config(self.config());
        self.emit(item, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct EmitHelper;

impl EmitHelper {
    pub fn write_line<W: Write>(writer: &mut W, context: &EmitContext, text: &str) -> EmitResult {
        writeln!(writer, "{}{}", context.get_indent(), text)?;
        Ok(())
    }

    pub fn write_toned_line<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        text: &str,
        tone: Tone,
    ) -> EmitResult {
        Self::write_line(writer, context, &tone.paint(text, context.use_colors))
    }

    pub fn write_comment<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        comment: &str,
    ) -> EmitResult {
        Self::write_toned_line(writer, context, &format!("; {}", comment), Tone::Muted)
    }

    pub fn write_section<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        title: &str,
    ) -> EmitResult {
        writeln!(writer)?;
        Self::write_toned_line(writer, context, &format!("=== {} ===", title), Tone::Heading)
    }

    /// A subsection title followed by one indented line per item. Nothing is written for an
    /// empty list.
    pub fn write_list<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        title: &str,
        items: &[String],
    ) -> EmitResult {
        if items.is_empty() {
            return Ok(());
        }
        Self::write_toned_line(writer, context, title, Tone::Keyword)?;
        let nested = context.nested();
        for item in items {
            Self::write_line(writer, &nested, item)?;
        }
        Ok(())
    }
}
