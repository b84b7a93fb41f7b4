/*!
The `csv-textfield` crate reads and writes delimited text (CSV and friends)
with the same grammar as the classic TextFieldParser, including its
handling of quoted fields that span lines, multi-character delimiters and
configurable quote and escape characters.

# Overview

The [`Reader`](struct.Reader.html) type pulls records out of any
`io::Read`. Each record is a `Vec<String>`. When a line cannot be parsed,
`read_record` reports it as an [`Error::MalformedLine`](enum.Error.html)
and moves on, so a single bad line never aborts the whole input.

The [`Writer`](struct.Writer.html) type is the inverse. It quotes exactly
those fields that the reader would otherwise split or misread.

By default the reader fixes several defects of the classic parser. Setting
`compatibility_mode` reproduces them instead, which is useful when output
has to match an existing system field for field.

# Example

```
use csv_textfield::Reader;

# fn example() -> csv_textfield::Result<()> {
let data = "\
name,note
\"Creed, Apollo\",champion
\"Robert \"\"Rocky\"\" Balboa\",\"multi
line\"
";
let mut rdr = Reader::from_reader(data.as_bytes());
let mut records = vec![];
while let Some(record) = rdr.read_record()? {
    records.push(record);
}
assert_eq!(records[1], vec!["Creed, Apollo", "champion"]);
assert_eq!(records[2], vec!["Robert \"Rocky\" Balboa", "multi\nline"]);
# Ok(())
# }
# example().unwrap();
```

# Recovering from malformed lines

```
use csv_textfield::Reader;

let data = "1,ok\n\"2\"x,bad\n3,ok\n";
let mut rdr = Reader::from_reader(data.as_bytes());
let mut good = vec![];
for result in rdr.records() {
    match result {
        Ok(record) => good.push(record[0].clone()),
        Err(err) => assert!(err.is_malformed_line()),
    }
}
assert_eq!(good, vec!["1", "3"]);
assert_eq!(rdr.error_line(), "\"2\"x,bad");
assert_eq!(rdr.error_line_number(), 2);
```

# Writing

```
use csv_textfield::{Terminator, WriterBuilder};

# fn example() -> csv_textfield::Result<()> {
let mut wtr = WriterBuilder::new()
    .terminator(Terminator::LF)
    .from_writer(vec![])?;
wtr.write_record(&["a,b", "say \"hi\"", "plain"])?;
let data = String::from_utf8(wtr.into_inner()?).unwrap();
assert_eq!(data, "\"a,b\",\"say \"\"hi\"\"\",plain\n");
# Ok(())
# }
# example().unwrap();
```
*/

#![deny(missing_docs)]

pub use crate::config::{QuoteStyle, ReaderConfig, Terminator, WriterConfig};
pub use crate::error::{Error, Result};
pub use crate::reader::{Reader, ReaderBuilder, RecordsIter};
pub use crate::writer::{Writer, WriterBuilder};

mod config;
mod error;
mod reader;
mod source;
mod writer;
