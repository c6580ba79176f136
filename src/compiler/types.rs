use std::path::PathBuf;

/// Merged source text plus its line-start offset table.
///
/// `line_offsets[0]` is always 0 and the table is strictly increasing.
/// Rebuilt whenever the text length changes due to expansion.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    pub text: String,
    pub line_offsets: Vec<usize>,
}

impl SourceBuffer {
    pub fn new(text: String) -> Self {
        let mut buf = Self {
            text,
            line_offsets: Vec::new(),
        };
        buf.rebuild_offsets();
        buf
    }

    pub fn rebuild_offsets(&mut self) {
        self.line_offsets.clear();
        self.line_offsets.push(0);
        for (i, b) in self.text.bytes().enumerate() {
            if b == b'\n' {
                self.line_offsets.push(i + 1);
            }
        }
    }

    /// 0-based line number of a byte offset.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_offsets
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Byte offset of the start of the line containing `offset`.
    pub fn line_start(&self, offset: usize) -> usize {
        self.line_offsets[self.line_of(offset)]
    }
}

/// Half-open byte range in the merged buffer contributed by one included
/// file. Spans are disjoint and ordered by `start`; used solely to
/// attribute an error or block back to its origin file.
#[derive(Debug, Clone)]
pub struct IncludeSpan {
    pub path: PathBuf,
    pub start: usize,
    pub end: usize,
}

/// Find the include span a byte offset falls into, if any.
/// `None` means the offset belongs to the root unit itself.
pub fn origin_of(spans: &[IncludeSpan], offset: usize) -> Option<&IncludeSpan> {
    spans.iter().find(|s| s.start <= offset && offset < s.end)
}

/// One line within a block body: a name plus raw argument tokens.
/// No type or arity constraints are imposed here; the consuming object
/// decides validity.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    /// 0-based line of the command within the block body.
    pub line: usize,
}

/// One `TYPE [ANNOTATION] NAME { commands }` declaration.
#[derive(Debug, Clone)]
pub struct Block {
    /// Originating include file; `None` for the root unit.
    pub origin_file: Option<PathBuf>,
    /// 1-based line within the origin file.
    pub line: usize,
    /// Byte offset of the header within its line.
    pub column_offset: usize,
    pub type_token: String,
    pub annotation_token: Option<String>,
    pub name_token: String,
    /// Body text between the braces, exclusive.
    pub body: String,
    pub commands: Vec<Command>,
}

impl Block {
    /// All commands with the given name, in declaration order.
    pub fn find_commands<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Command> {
        self.commands.iter().filter(move |c| c.name == name)
    }
}
