pub const BAR_WIDTH: usize = 20;

pub const HELP_TEXT: &str = "\
Commands:
  select <path>        choose a ZIP archive
  drop <path>...       same as select; only the first file is used
  prompt <text>        what to detect (blank = \"Find all objects\")
  remove               forget the selected file
  submit               upload and start processing
  retry                resubmit after an error
  download             save the processed archive
  reset                start over with a new upload
  theme                toggle light/dark mode
  status               redraw the current state
  help                 this text
  quit                 leave";
