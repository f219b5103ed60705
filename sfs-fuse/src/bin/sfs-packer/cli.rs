use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Build and inspect sfs images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a fresh image and format it
    Format {
        /// Image file
        #[arg(long, short)]
        image: PathBuf,

        /// Number of blocks in the image
        #[arg(long, short, default_value_t = 1024)]
        blocks: usize,
    },

    /// Format a fresh image and copy every regular file of a directory into it
    Pack {
        /// Image file
        #[arg(long, short)]
        image: PathBuf,

        /// Number of blocks in the image
        #[arg(long, short, default_value_t = 1024)]
        blocks: usize,

        /// Source directory
        #[arg(long, short)]
        source: PathBuf,
    },

    /// Print the super block and every valid inode
    Debug {
        /// Image file
        #[arg(long, short)]
        image: PathBuf,
    },

    /// Write the content of an inode to stdout
    Cat {
        /// Image file
        #[arg(long, short)]
        image: PathBuf,

        /// Inode number
        #[arg(long, short = 'n')]
        inode: u32,
    },
}
