use std::fs::File;
use std::io::{BufWriter, Write};

// 定义一个宏来简化汇编代码的写入
macro_rules! write_asm {
    ($writer:expr, $($line:literal)*) => {
        $writer.write_all(concat!($($line, "\n"),*).as_bytes())
    };
}

#[derive(Clone, Copy)]
enum SegmentSymbol {
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
    Constant,
}

impl SegmentSymbol {
    fn from_str(segment: &str) -> Option<Self> {
        match segment {
            "local" => Some(SegmentSymbol::Local),
            "argument" => Some(SegmentSymbol::Argument),
            "this" => Some(SegmentSymbol::This),
            "that" => Some(SegmentSymbol::That),
            "temp" => Some(SegmentSymbol::Temp),
            "pointer" => Some(SegmentSymbol::Pointer),
            "static" => Some(SegmentSymbol::Static),
            "constant" => Some(SegmentSymbol::Constant),
            _ => None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            SegmentSymbol::Local => "LCL",
            SegmentSymbol::Argument => "ARG",
            SegmentSymbol::This => "THIS",
            SegmentSymbol::That => "THAT",
            SegmentSymbol::Temp => "R5",
            SegmentSymbol::Pointer => "THIS", // Special case handled separately
            SegmentSymbol::Static => "STATIC", // Special case handled separately
            SegmentSymbol::Constant => "CONSTANT", // Special case handled separately
        }
    }
}

pub struct CodeWriter {
    output_file: BufWriter<File>,
    label_counter: usize,
    filename: String,
    current_function: String,
    call_counter: usize,
}

impl CodeWriter {
    /// 创建一个新的CodeWriter实例，用于将汇编代码写入指定的输出文件，默认启动使用Buf占据8192字节。
    ///
    /// Writes the bootstrap sequence (`SP=256`, `call Sys.init 0`) so the
    /// translated program starts from the OS entry point, matching the
    /// original translator's constructor.
    pub fn new(output_filename: &str) -> Result<Self, std::io::Error> {
        let file = File::create(output_filename)?;
        let buffered = BufWriter::with_capacity(8192, file);
        let mut writer = CodeWriter {
            output_file: buffered,
            label_counter: 0,
            filename: String::new(),
            current_function: String::new(),
            call_counter: 0,
        };
        writer.write_bootstrap()?;
        Ok(writer)
    }

    /// Creates a writer with no bootstrap, for tests that want to inspect
    /// the assembly for a single command in isolation.
    #[cfg(test)]
    pub fn new_without_bootstrap(output_filename: &str) -> Result<Self, std::io::Error> {
        let file = File::create(output_filename)?;
        let buffered = BufWriter::with_capacity(8192, file);
        Ok(CodeWriter {
            output_file: buffered,
            label_counter: 0,
            filename: String::new(),
            current_function: String::new(),
            call_counter: 0,
        })
    }

    fn write_bootstrap(&mut self) -> Result<(), std::io::Error> {
        write_asm!(self.output_file,
            "// Bootstrap code"
            "@256"
            "D=A"
            "@SP"
            "M=D"
        )?;
        self.current_function = "Sys.init".to_string();
        self.write_call("Sys.init", 0)
    }

    #[inline]
    pub fn set_filename(&mut self, filename: &str) {
        // Extract filename without path and extension
        let name = std::path::Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown");
        self.filename.clear();
        self.filename.push_str(name);
    }

    pub fn write_arithmetic(&mut self, command: &str) -> Result<(), std::io::Error> {
        writeln!(self.output_file, "// vm command:{}", command)?;

        match command.to_ascii_lowercase().as_str() {
            "add" => self.write_binary_op("D+M"),
            "sub" => self.write_binary_op("D-M"),
            "and" => self.write_binary_op("D&M"),
            "or" => self.write_binary_op("D|M"),
            "neg" => self.write_unary_op(true),
            "not" => self.write_unary_op(false),
            "eq" => self.write_comparison("JEQ"),
            "gt" => self.write_comparison("JGT"),
            "lt" => self.write_comparison("JLT"),
            _ => panic!("Unknown arithmetic command: {}", command),
        }
    }

    #[inline]
    fn write_binary_op(&mut self, operation: &str) -> Result<(), std::io::Error> {
        // Optimized: write all at once to reduce syscalls
        write!(
            self.output_file,
            "// get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R14\n\
             M=D\n\
             // get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R13\n\
             M=D\n\
             @R13\n\
             D=M\n\
             @R14\n\
             D={}\n",
            operation
        )?;

        self.write_push_d()?;
        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_unary_op(&mut self, is_neg: bool) -> Result<(), std::io::Error> {
        write_asm!(self.output_file,
            "// get the top element of stack"
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
        )?;

        if is_neg {
            write_asm!(self.output_file,
                "@0"
                "D=A-D"
            )?;
        } else {
            write_asm!(self.output_file, "D=!D")?;
        }

        self.write_push_d()?;
        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_comparison(&mut self, jump: &str) -> Result<(), std::io::Error> {
        let label_prefix = match jump {
            "JEQ" => "EQ",
            "JGT" => "GT",
            "JLT" => "LT",
            _ => jump,
        };
        let label_num = self.label_counter;
        self.label_counter += 1;

        write!(
            self.output_file,
            "// get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R14\n\
             M=D\n\
             // get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R13\n\
             M=D\n\
             @R13\n\
             D=M\n\
             @R14\n\
             D=D-M\n\
             @{}{}\n\
             D;{}\n\
             // push the value into stack\n\
             @SP\n\
             A=M\n\
             M=0\n\
             @SP\n\
             M=M+1\n\
             @END{}{}\n\
             0;JMP\n\
             ({}{})\n\
             // push the value into stack\n\
             @SP\n\
             A=M\n\
             M=-1\n\
             @SP\n\
             M=M+1\n\
             (END{}{})\n\n",
            label_prefix,
            label_num,
            jump,
            label_prefix,
            label_num,
            label_prefix,
            label_num,
            label_prefix,
            label_num
        )
    }

    pub fn write_push_pop(
        &mut self,
        command: &str,
        segment: &str,
        index: i32,
    ) -> Result<(), std::io::Error> {
        writeln!(
            self.output_file,
            "// vm command:{} {} {}",
            command, segment, index
        )?;

        if command == "push" {
            self.write_push(segment, index)?;
        } else if command == "pop" {
            self.write_pop(segment, index)?;
        }

        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_push(&mut self, segment: &str, index: i32) -> Result<(), std::io::Error> {
        match SegmentSymbol::from_str(segment) {
            Some(SegmentSymbol::Constant) => {
                write!(self.output_file, "@{}\nD=A\n", index)?;
                self.write_push_d()
            }
            Some(seg)
                if matches!(
                    seg,
                    SegmentSymbol::Local
                        | SegmentSymbol::Argument
                        | SegmentSymbol::This
                        | SegmentSymbol::That
                ) =>
            {
                let segment_symbol = seg.symbol();
                write!(
                    self.output_file,
                    "@{}\nD=M\n@{}\nA=D+A\nD=M\n",
                    segment_symbol, index
                )?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Temp) => {
                write!(self.output_file, "@R5\nD=A\n@{}\nA=D+A\nD=M\n", index)?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Pointer) => {
                write!(self.output_file, "@THIS\nD=A\n@{}\nA=D+A\nD=M\n", index)?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Static) => {
                write!(self.output_file, "@{}.{}\nD=M\n", self.filename, index)?;
                self.write_push_d()
            }
            _ => panic!("Unknown segment: {}", segment),
        }
    }

    #[inline]
    fn write_pop(&mut self, segment: &str, index: i32) -> Result<(), std::io::Error> {
        match SegmentSymbol::from_str(segment) {
            Some(seg)
                if matches!(
                    seg,
                    SegmentSymbol::Local
                        | SegmentSymbol::Argument
                        | SegmentSymbol::This
                        | SegmentSymbol::That
                ) =>
            {
                let segment_symbol = seg.symbol();
                write!(
                    self.output_file,
                    "@{}\n\
                     D=M\n\
                     @{}\n\
                     D=D+A\n\
                     // store the result temporarily\n\
                     @R13\n\
                     M=D\n",
                    segment_symbol, index
                )?;

                self.write_pop_to_d()?;

                write_asm!(self.output_file,
                    "// store the top value"
                    "@R13"
                    "A=M"
                    "M=D"
                )?;
                Ok(())
            }
            Some(SegmentSymbol::Temp) => {
                write!(
                    self.output_file,
                    "@5\n\
                     D=A\n\
                     @{}\n\
                     D=D+A\n\
                     // store the result temporarily\n\
                     @R13\n\
                     M=D\n",
                    index
                )?;

                self.write_pop_to_d()?;

                write_asm!(self.output_file,
                    "// store the top value"
                    "@R13"
                    "A=M"
                    "M=D"
                )?;
                Ok(())
            }
            Some(SegmentSymbol::Pointer) => {
                write!(
                    self.output_file,
                    "@THIS\n\
                     D=A\n\
                     @{}\n\
                     D=D+A\n\
                     // store the result temporarily\n\
                     @R13\n\
                     M=D\n",
                    index
                )?;

                self.write_pop_to_d()?;

                write_asm!(self.output_file,
                    "// store the top value"
                    "@R13"
                    "A=M"
                    "M=D"
                )?;
                Ok(())
            }
            Some(SegmentSymbol::Static) => {
                self.write_pop_to_d()?;
                write!(self.output_file, "@{}.{}\nM=D\n", self.filename, index)
            }
            _ => panic!("Cannot pop to segment: {}", segment),
        }
    }

    #[inline]
    fn write_push_d(&mut self) -> Result<(), std::io::Error> {
        write_asm!(self.output_file,
            "// push the value into stack"
            "@SP"
            "A=M"
            "M=D"
            "@SP"
            "M=M+1"
        )
    }

    #[inline]
    fn write_pop_to_d(&mut self) -> Result<(), std::io::Error> {
        write_asm!(self.output_file,
            "// get the top element of stack"
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
        )
    }

    /// Writes `(functionName$label)`, qualifying the user-supplied label
    /// by the enclosing function so labels from different functions never
    /// collide.
    pub fn write_label(&mut self, label: &str) -> Result<(), std::io::Error> {
        writeln!(self.output_file, "({}${})", self.current_function, label)
    }

    pub fn write_goto(&mut self, label: &str) -> Result<(), std::io::Error> {
        write!(
            self.output_file,
            "@{}${}\n0;JMP\n",
            self.current_function, label
        )
    }

    pub fn write_if(&mut self, label: &str) -> Result<(), std::io::Error> {
        write!(
            self.output_file,
            "@SP\nAM=M-1\nD=M\n@{}${}\nD;JNE\n",
            self.current_function, label
        )
    }

    /// Writes the function entry label and zero-initializes its `nvars`
    /// locals. Resets the per-function call counter used to qualify
    /// `call` return-address labels.
    pub fn write_function(&mut self, name: &str, nvars: i32) -> Result<(), std::io::Error> {
        self.call_counter = 0;
        self.current_function = name.to_string();

        writeln!(self.output_file, "({name})")?;
        write_asm!(self.output_file,
            "@SP"
            "A=M"
        )?;
        for _ in 0..nvars {
            write_asm!(self.output_file,
                "M=0"
                "@SP"
                "AM=M+1"
            )?;
        }
        Ok(())
    }

    /// Writes the full call sequence: push the return address and the
    /// caller's segment pointers, reposition `ARG`/`LCL`, jump to the
    /// callee, then emit the return-address label qualified as
    /// `currentFunction$ret.k`.
    pub fn write_call(&mut self, name: &str, nargs: i32) -> Result<(), std::io::Error> {
        let return_label = format!("{}$ret.{}", self.current_function, self.call_counter);

        write!(self.output_file, "@{return_label}\nD=A\n")?;
        self.write_push_d()?;

        for pointer in ["LCL", "ARG", "THIS", "THAT"] {
            write!(self.output_file, "@{pointer}\nD=M\n")?;
            self.write_push_d()?;
        }

        // ARG = SP - nargs - 5
        write!(
            self.output_file,
            "@{nargs}\nD=A\n@5\nD=D+A\n@SP\nD=M-D\n@ARG\nM=D\n"
        )?;

        // LCL = SP
        write_asm!(self.output_file,
            "@SP"
            "D=M"
            "@LCL"
            "M=D"
        )?;

        writeln!(self.output_file, "@{name}\n0;JMP")?;
        writeln!(self.output_file, "({return_label})")?;

        self.call_counter += 1;
        Ok(())
    }

    /// Writes the return sequence. The return address is saved to `R13`
    /// before `ARG` is overwritten, since the frame base (`LCL-5`) that
    /// yields it depends on the callee's own `LCL`, not the caller's.
    pub fn write_return(&mut self) -> Result<(), std::io::Error> {
        // R13 = *(LCL - 5)   (the saved return address)
        write_asm!(self.output_file,
            "@LCL"
            "D=M"
            "@5"
            "A=D-A"
            "D=M"
            "@R13"
            "M=D"
        )?;

        // *ARG = pop()
        self.write_pop("argument", 0)?;

        // SP = ARG + 1
        write_asm!(self.output_file,
            "@ARG"
            "D=M+1"
            "@SP"
            "M=D"
        )?;

        // Restore THAT/THIS/ARG/LCL from LCL-1/-2/-3/-4, in that order.
        for (pointer, offset) in [("THAT", 1), ("THIS", 2), ("ARG", 3), ("LCL", 4)] {
            write!(
                self.output_file,
                "@{offset}\nD=A\n@LCL\nA=M-D\nD=M\n@{pointer}\nM=D\n"
            )?;
        }

        write_asm!(self.output_file,
            "@R13"
            "A=M"
            "0;JMP"
        )
    }

    #[inline]
    pub fn close(&mut self) -> Result<(), std::io::Error> {
        self.output_file.flush()
    }
}
