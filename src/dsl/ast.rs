//! Abstract Syntax Tree for the scene DSL.
//!
//! A [`Program`] is an ordered list of scenes. Statements and expressions are
//! sum types carrying only the fields relevant to each variant, and every node
//! remembers the 1-based source line it started on.

use serde::Serialize;

/// Declares a reserved-word vocabulary enum with its keyword spelling.
macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn from_keyword(word: &str) -> Option<Self> {
                match word {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum! {
    /// Kind of scene element an element declaration creates.
    ElementType {
        Array => "array",
        Matrix => "matrix",
        Stack => "stack",
        Queue => "queue",
        List => "list",
        Tree => "tree",
        Graph => "graph",
        Node => "node",
        Pointer => "pointer",
        Text => "text",
        Shape => "shape",
    }
}

keyword_enum! {
    /// Animation applied to one or more targets.
    AnimationAction {
        Highlight => "highlight",
        Unhighlight => "unhighlight",
        Swap => "swap",
        Compare => "compare",
        Move => "move",
        Set => "set",
        Mark => "mark",
        Visit => "visit",
        Push => "push",
        Pop => "pop",
        Fade => "fade",
        Pulse => "pulse",
        Show => "show",
        Hide => "hide",
    }
}

keyword_enum! {
    /// Camera movement following `camera`.
    CameraAction {
        Focus => "focus",
        Zoom => "zoom",
        Pan => "pan",
        Reset => "reset",
    }
}

keyword_enum! {
    /// Built-in sound cue following `play`.
    AudioCue {
        Beep => "beep",
        Click => "click",
        Ding => "ding",
        Success => "success",
        Failure => "failure",
        Whoosh => "whoosh",
    }
}

keyword_enum! {
    /// Named command option (`duration 500ms`, `color "red"`, ...).
    OptionKey {
        Duration => "duration",
        Delay => "delay",
        Color => "color",
        Easing => "easing",
        Label => "label",
        Value => "value",
        To => "to",
        Scale => "scale",
        Volume => "volume",
    }
}

impl ElementType {
    /// Whether an element of this type holds an array when declared without
    /// an initial value.
    pub fn is_sequence(self) -> bool {
        matches!(
            self,
            ElementType::Array
                | ElementType::Matrix
                | ElementType::Stack
                | ElementType::Queue
                | ElementType::List
        )
    }
}

/// A complete DSL program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub scenes: Vec<SceneBlock>,
}

impl Program {
    /// First scene with the given name.
    pub fn scene(&self, name: &str) -> Option<&SceneBlock> {
        self.scenes.iter().find(|s| s.name == name)
    }

    /// Names of all scenes, in source order.
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.iter().map(|s| s.name.as_str()).collect()
    }
}

/// A `scene "name" { ... }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBlock {
    pub name: String,
    pub body: Vec<Statement>,
    pub line: usize,
}

/// A statement with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    ElementDeclaration {
        element_type: ElementType,
        name: String,
        value: Option<Expr>,
        position: Option<(Expr, Expr)>,
    },
    VariableDeclaration {
        name: String,
        value: Expr,
    },
    Assignment {
        target: AssignTarget,
        value: Expr,
    },
    ForLoop {
        var: String,
        start: Expr,
        end: Expr,
        body: Vec<Statement>,
    },
    WhileLoop {
        condition: Expr,
        body: Vec<Statement>,
    },
    IfStatement {
        condition: Expr,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    ParallelBlock {
        body: Vec<Statement>,
    },
    WaitCommand {
        mode: WaitMode,
        duration: Option<Expr>,
    },
    CameraCommand {
        action: CameraAction,
        targets: Vec<Expr>,
        options: Vec<CommandOption>,
    },
    AudioCommand {
        cue: AudioCue,
        options: Vec<CommandOption>,
    },
    AnimationCommand {
        action: AnimationAction,
        targets: Vec<Expr>,
        options: Vec<CommandOption>,
    },
}

/// `wait` advances time silently; `pause` also leaves a playback marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    Wait,
    Pause,
}

/// Left-hand side of an assignment: `x`, `x[i]`, `x.p[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignTarget {
    pub name: String,
    pub accessors: Vec<Accessor>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    Member(String),
    Index(Expr),
}

/// A `name expr` option pair attached to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub key: OptionKey,
    pub value: Expr,
}

/// An expression with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Number(f64),
    String(String),
    Boolean(bool),
    /// Seconds; `ms` literals are divided by 1000 at parse time.
    Duration(f64),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Identifier(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}
