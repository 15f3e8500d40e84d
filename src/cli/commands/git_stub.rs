//! Git-plumbing commands: `commit`, `push`, `tag`, `stash`, `remote`,
//! `fetch`, `merge`, `checkout`/`switch`, `add`, `absorb`, `stack`, `undo`,
//! `reflog`. All of these require either shelling out to the `git` binary
//! or AI-generated commit/PR text, both out of scope here. Every arg shape
//! below still matches the documented flags so `clap` parsing (and thus
//! `--help`) stays accurate even though the handler itself stubs out.

use anyhow::Result;
use clap::{Args, Subcommand};
use cv_core::CvError;

fn unimplemented() -> Result<()> {
    Err(CvError::Internal("not implemented in this build".into()).into())
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short = 'a', long = "all")]
    pub all: bool,
    #[arg(short = 'm', long = "message")]
    pub message: Option<String>,
    #[arg(long = "no-ai")]
    pub no_ai: bool,
}

pub fn commit(_args: CommitArgs) -> Result<()> {
    unimplemented()
}

pub fn push() -> Result<()> {
    unimplemented()
}

#[derive(Args)]
pub struct TagArgs {
    #[arg(short = 'a', long = "annotate")]
    pub annotate: bool,
    #[arg(short = 'm', long = "message")]
    pub message: Option<String>,
    #[arg(short = 'd', long = "delete")]
    pub delete: bool,
    #[arg(short = 'l', long = "list")]
    pub list: Option<String>,
    #[arg(short = 'v', long = "verify")]
    pub verify: bool,
    pub name: Option<String>,
}

pub fn tag(_args: TagArgs) -> Result<()> {
    unimplemented()
}

#[derive(Subcommand)]
pub enum StashAction {
    Push,
    Pop,
    Apply,
    List,
    Show,
    Drop,
    Clear,
    Branch { name: String },
    Create,
    Store,
}

pub fn stash(_action: StashAction) -> Result<()> {
    unimplemented()
}

#[derive(Subcommand)]
pub enum RemoteAction {
    Add { name: String, url: String },
    Remove { name: String },
    Rename { old: String, new: String },
    SetUrl { name: String, url: String },
    Show { name: Option<String> },
    Prune { name: Option<String> },
}

pub fn remote(_action: RemoteAction) -> Result<()> {
    unimplemented()
}

#[derive(Args)]
pub struct FetchArgs {
    #[arg(long)]
    pub all: bool,
    #[arg(short = 'p', long = "prune")]
    pub prune: bool,
    #[arg(short = 't', long = "tags")]
    pub tags: bool,
    #[arg(long)]
    pub depth: Option<u32>,
}

pub fn fetch(_args: FetchArgs) -> Result<()> {
    unimplemented()
}

#[derive(Args)]
pub struct MergeArgs {
    pub branch: Option<String>,
    #[arg(long = "no-ff")]
    pub no_ff: bool,
    #[arg(long = "ff-only")]
    pub ff_only: bool,
    #[arg(long)]
    pub squash: bool,
    #[arg(long)]
    pub abort: bool,
    #[arg(long)]
    pub r#continue: bool,
}

pub fn merge(_args: MergeArgs) -> Result<()> {
    unimplemented()
}

#[derive(Args)]
pub struct CheckoutArgs {
    pub branch: Option<String>,
    #[arg(short = 'b', long = "create")]
    pub create: Option<String>,
    #[arg(short = 'c')]
    pub create_short: Option<String>,
    #[arg(long = "skip-sync")]
    pub skip_sync: bool,
}

pub fn checkout(_args: CheckoutArgs) -> Result<()> {
    unimplemented()
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(short = 'A', long = "all")]
    pub all: bool,
    #[arg(short = 'p', long = "patch")]
    pub patch: bool,
    #[arg(short = 'u', long = "update")]
    pub update: bool,
    #[arg(short = 'N', long = "intent-to-add")]
    pub intent_to_add: bool,
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
    pub paths: Vec<String>,
}

pub fn add(_args: AddArgs) -> Result<()> {
    unimplemented()
}

#[derive(Args)]
pub struct AbsorbArgs {
    #[arg(long = "and-rebase")]
    pub and_rebase: bool,
    #[arg(long)]
    pub base: Option<String>,
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn absorb(_args: AbsorbArgs) -> Result<()> {
    unimplemented()
}

#[derive(Subcommand)]
pub enum StackAction {
    Status,
    Log,
    Create,
    Push,
    Rebase,
    Submit,
    Sync,
}

pub fn stack(_action: StackAction) -> Result<()> {
    unimplemented()
}

#[derive(Args)]
pub struct UndoArgs {
    pub target: Option<String>,
    #[arg(long)]
    pub hard: bool,
    #[arg(short = 'n')]
    pub n: Option<u32>,
}

pub fn undo(_args: UndoArgs) -> Result<()> {
    unimplemented()
}

#[derive(Args)]
pub struct ReflogArgs {
    #[arg(short = 'n')]
    pub n: Option<u32>,
}

pub fn reflog(_args: ReflogArgs) -> Result<()> {
    unimplemented()
}
