use dish_dashboard::dashboard::Dashboard;

pub(super) const USAGE: &str = "Usage:
  toggle <n|id>   publish or unpublish the dish on card n (alias: t)
  help            show this message (alias: h)
  quit            leave the dashboard (alias: q)";

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Command {
    Toggle(Target),
    Help,
    Quit,
}

/// One read from stdin. `None` means stdin reached EOF.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Input {
    Blank,
    Closed,
    Command(Command),
    Invalid(&'static str),
}

impl Input {
    pub(super) fn new(line: Option<&str>) -> Self {
        match line {
            None => Self::Closed,
            Some(line) if line.trim().is_empty() => Self::Blank,
            Some(line) => match Command::new(line) {
                Ok(cmd) => Self::Command(cmd),
                Err(hint) => Self::Invalid(hint),
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Target {
    /// 1-based card index, or an id that happens to be all digits.
    Index(usize),
    Id(String),
}

impl Command {
    // I need:
    //  toggle <n|id>
    pub(super) fn new(line: &str) -> Result<Self, &'static str> {
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some(cmd) = args.first() else {
            return Err("empty command");
        };

        match *cmd {
            "toggle" | "t" => {
                if args.len() < 2 {
                    Err("too less argument")
                } else {
                    Ok(Self::Toggle(Target::new(args[1])))
                }
            }
            "help" | "h" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            _ => Err("unexpected command"),
        }
    }
}

impl Target {
    fn new(arg: &str) -> Self {
        match arg.parse() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Id(arg.to_string()),
        }
    }

    /// Id of the dish this target points at, if it is on screen.
    pub(super) fn resolve(&self, dashboard: &Dashboard) -> Option<String> {
        match self {
            Self::Index(index) => dashboard
                .dish_at(*index)
                .or_else(|| dashboard.find(&index.to_string()))
                .map(|dish| dish.id.clone()),
            Self::Id(id) => dashboard.find(id).map(|dish| dish.id.clone()),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "card {index}"),
            Self::Id(id) => write!(f, "dish {id}"),
        }
    }
}
