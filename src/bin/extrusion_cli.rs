#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("extrusion_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use lod_extrusion::LodExtrusion;
    use lod_extrusion::geom::{
        AxisRotation, DrawCounter, ExtrusionDiagnostics, ExtrusionMesh, LodThresholds, Point3, Vec2,
        Vec3,
    };
    use lod_extrusion::parse::extrusion_xml;
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"extrusion_cli (lod-extrusion)

USAGE:
  extrusion_cli list
  extrusion_cli run <scenario|all> [options]
  extrusion_cli load <file.xml> [options]

SCENARIOS:
  square_tube
  circle_bend
  closed_loop
  locked_helix
  scaled_twist
  long_spine_lod

OPTIONS:
  --out-dir <dir>     Write <scenario>.obj and/or <scenario>.snap to this dir (required for `run all`)
  --obj <path>        Write OBJ (single shape only)
  --snap <path>       Write snapshot (single shape only)
  --no-obj            Skip OBJ when using --out-dir
  --no-snap           Skip snapshot when using --out-dir
  --camera <x,y,z>    Include the LOD plan for this camera position
  --overwrite         Overwrite existing output files
  -h, --help          Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "load" => cmd_load(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    struct Options {
        out_dir: Option<PathBuf>,
        obj_path: Option<PathBuf>,
        snap_path: Option<PathBuf>,
        camera: Option<Point3>,
        overwrite: bool,
        write_obj: bool,
        write_snap: bool,
        help: bool,
    }

    impl Options {
        fn parse(args: &mut Args) -> Result<Self, String> {
            let mut options = Self {
                out_dir: None,
                obj_path: None,
                snap_path: None,
                camera: None,
                overwrite: false,
                write_obj: true,
                write_snap: true,
                help: false,
            };

            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--out-dir" => options.out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                    "--obj" => options.obj_path = Some(PathBuf::from(args.value("--obj")?)),
                    "--snap" => options.snap_path = Some(PathBuf::from(args.value("--snap")?)),
                    "--camera" => options.camera = Some(parse_point(&args.value("--camera")?)?),
                    "--overwrite" => options.overwrite = true,
                    "--no-obj" => options.write_obj = false,
                    "--no-snap" => options.write_snap = false,
                    "-h" | "--help" => options.help = true,
                    other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
                }
            }

            if options.out_dir.is_some() {
                if options.obj_path.is_some() || options.snap_path.is_some() {
                    return Err("use either --out-dir or --obj/--snap (not both)".to_string());
                }
                if !options.write_obj && !options.write_snap {
                    return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
                }
            }
            Ok(options)
        }
    }

    fn parse_point(text: &str) -> Result<Point3, String> {
        let coords = text
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid point `{text}`: {e}"))?;
        match coords.as_slice() {
            [x, y, z] => Ok(Point3::new(*x, *y, *z)),
            _ => Err(format!("invalid point `{text}`: expected x,y,z")),
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;
        let options = Options::parse(args)?;
        if options.help {
            print_usage();
            return Ok(());
        }

        if let Some(dir) = options.out_dir.as_ref() {
            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    let output = run_shape(scenario.name(), &mut scenario.build(), options.camera);
                    write_to_dir(&output, dir, &options)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(&scenario_name).ok_or_else(|| unknown_scenario(&scenario_name))?;
            let output = run_shape(scenario.name(), &mut scenario.build(), options.camera);
            return write_to_dir(&output, dir, &options);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario = Scenario::from_str(&scenario_name).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_shape(scenario.name(), &mut scenario.build(), options.camera);
        write_single(&output, &options)
    }

    fn cmd_load(args: &mut Args) -> Result<(), String> {
        let path = PathBuf::from(args.next().ok_or("missing XML file")?);
        let options = Options::parse(args)?;
        if options.help {
            print_usage();
            return Ok(());
        }

        let xml = fs::read_to_string(&path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let mut shape = extrusion_xml::parse_str(&xml).map_err(|e| format!("parse {}: {e}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("extrusion")
            .to_string();
        let output = run_shape(&name, &mut shape, options.camera);

        match options.out_dir.as_ref() {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;
                write_to_dir(&output, dir, &options)
            }
            None => write_single(&output, &options),
        }
    }

    struct ShapeOutput {
        name: String,
        mesh: std::sync::Arc<ExtrusionMesh>,
        diagnostics: ExtrusionDiagnostics,
        snapshot: String,
    }

    fn run_shape(name: &str, shape: &mut LodExtrusion, camera: Option<Point3>) -> ShapeOutput {
        let mesh = shape.mesh();
        let diagnostics = shape.diagnostics();
        let bbox = shape.bounding_box();

        let snapshot = snapshot(name, |out| {
            let _ = writeln!(out, "spine.points {}", shape.spine().source_len());
            let _ = writeln!(out, "spine.closed {}", shape.spine().is_closed());
            let _ = writeln!(out, "mesh.vertex_count {}", mesh.vertex_count());
            let _ = writeln!(out, "mesh.triangle_count {}", mesh.triangle_count());
            let _ = writeln!(out, "mesh.segment_count {}", mesh.segment_count());
            let _ = writeln!(out, "mesh.ring_size {}", mesh.ring_size);
            let _ = writeln!(out, "mesh.reversed {}", mesh.reversed);
            if let Some(bbox) = bbox {
                write_vec3_line(out, "bbox.min", bbox.min.to_array());
                write_vec3_line(out, "bbox.max", bbox.max.to_array());
            }
            write_diagnostics(out, &diagnostics);
            write_mesh(out, &mesh);
            if let Some(camera) = camera {
                write_lod_plan(out, shape, camera);
            }
        });

        ShapeOutput {
            name: name.to_string(),
            mesh,
            diagnostics,
            snapshot,
        }
    }

    fn write_single(output: &ShapeOutput, options: &Options) -> Result<(), String> {
        if let Some(path) = options.snap_path.as_deref() {
            write_text_file(path, &output.snapshot, options.overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = options.obj_path.as_deref() {
            write_obj_file(path, &output.mesh, &output.name, options.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(output);
        Ok(())
    }

    fn write_to_dir(output: &ShapeOutput, dir: &Path, options: &Options) -> Result<(), String> {
        if options.write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, options.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if options.write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.mesh, &output.name, options.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(output);
        Ok(())
    }

    fn print_summary(output: &ShapeOutput) {
        eprintln!("{}: {}", output.name, output.diagnostics.summary());
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = format!("unknown scenario `{name}`\n\navailable scenarios:\n");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(path: &Path, mesh: &ExtrusionMesh, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        let err = |e: std::io::Error| format!("write obj: {e}");

        writeln!(w, "# lod-extrusion extrusion_cli").map_err(err)?;
        writeln!(w, "o {name}").map_err(err)?;
        for p in &mesh.positions {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(err)?;
        }
        for uv in &mesh.uvs {
            writeln!(w, "vt {} {}", uv[0], uv[1]).map_err(err)?;
        }
        for n in &mesh.normals {
            writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(err)?;
        }

        for tri in mesh.to_triangle_list().chunks_exact(3) {
            let a = tri[0] + 1;
            let b = tri[1] + 1;
            let c = tri[2] + 1;
            writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}").map_err(err)?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push(' ');
        write_f64(out, v[2]);
        out.push('\n');
    }

    fn write_vec2_line(out: &mut String, prefix: &str, v: [f64; 2]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push('\n');
    }

    fn write_diagnostics(out: &mut String, diag: &ExtrusionDiagnostics) {
        let _ = writeln!(out, "diag.degenerate_tangent_count {}", diag.degenerate_tangent_count);
        let _ = writeln!(out, "diag.antiparallel_fallback_count {}", diag.antiparallel_fallback_count);
        let _ = writeln!(out, "diag.synthesized_axis_count {}", diag.synthesized_axis_count);
        let _ = writeln!(out, "diag.twist_correction_count {}", diag.twist_correction_count);
        let _ = writeln!(out, "diag.winding_reversed {}", diag.winding_reversed);
        let _ = writeln!(out, "diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "diag.warning.{idx} {warning}");
        }
    }

    fn write_mesh(out: &mut String, mesh: &ExtrusionMesh) {
        for (idx, p) in mesh.positions.iter().enumerate() {
            write_vec3_line(out, &format!("v.{idx}"), *p);
        }
        for (idx, n) in mesh.normals.iter().enumerate() {
            write_vec3_line(out, &format!("vn.{idx}"), *n);
        }
        for (idx, uv) in mesh.uvs.iter().enumerate() {
            write_vec2_line(out, &format!("vt.{idx}"), *uv);
        }
        for (idx, strip) in mesh.strips().enumerate() {
            let indices: Vec<String> = strip.iter().map(u32::to_string).collect();
            let _ = writeln!(out, "strip.{idx} {}", indices.join(" "));
        }
    }

    fn write_lod_plan(out: &mut String, shape: &mut LodExtrusion, camera: Point3) {
        write_vec3_line(out, "lod.camera", camera.to_array());
        let thresholds = shape.thresholds();
        let _ = write!(out, "lod.thresholds ");
        write_f64(out, thresholds.near);
        out.push(' ');
        write_f64(out, thresholds.far);
        out.push('\n');

        for (idx, batch) in shape.lod_batches(camera).iter().enumerate() {
            let _ = writeln!(
                out,
                "lod.batch.{idx} {:?} {}..{}",
                batch.mode, batch.segments.start, batch.segments.end
            );
        }

        let mut counter = DrawCounter::default();
        shape.render(camera, &mut counter);
        let _ = writeln!(
            out,
            "lod.drawn strips={} triangles={} lines={} line_vertices={}",
            counter.triangle_strips, counter.triangles, counter.line_strips, counter.line_vertices
        );
    }

    fn snapshot(name: &str, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# lod-extrusion snapshot v1");
        let _ = writeln!(out, "shape {name}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        SquareTube,
        CircleBend,
        ClosedLoop,
        LockedHelix,
        ScaledTwist,
        LongSpineLod,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::SquareTube,
            Scenario::CircleBend,
            Scenario::ClosedLoop,
            Scenario::LockedHelix,
            Scenario::ScaledTwist,
            Scenario::LongSpineLod,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::SquareTube => "square_tube",
                Scenario::CircleBend => "circle_bend",
                Scenario::ClosedLoop => "closed_loop",
                Scenario::LockedHelix => "locked_helix",
                Scenario::ScaledTwist => "scaled_twist",
                Scenario::LongSpineLod => "long_spine_lod",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|scenario| scenario.name() == name)
        }

        fn build(self) -> LodExtrusion {
            let mut shape = LodExtrusion::new();
            match self {
                Scenario::SquareTube => {
                    shape.set_spine(vec![
                        Point3::new(0.0, 0.0, 0.0),
                        Point3::new(0.0, 2.0, 0.0),
                        Point3::new(0.0, 4.0, 0.0),
                    ]);
                }
                Scenario::CircleBend => {
                    shape.set_spine(vec![
                        Point3::new(0.0, 0.0, 0.0),
                        Point3::new(0.0, 4.0, 0.0),
                        Point3::new(4.0, 4.0, 0.0),
                    ]);
                    shape.set_radius(0.5);
                    shape.set_circle_segments(12);
                }
                Scenario::ClosedLoop => {
                    shape.set_spine(vec![
                        Point3::new(5.0, 0.0, 0.0),
                        Point3::new(0.0, 5.0, 0.0),
                        Point3::new(-5.0, 0.0, 0.0),
                        Point3::new(0.0, -5.0, 0.0),
                        Point3::new(5.0, 0.0, 0.0),
                    ]);
                    shape.set_radius(0.4);
                    shape.set_circle_segments(8);
                }
                Scenario::LockedHelix => {
                    let points = (0..=24)
                        .map(|i| {
                            let a = f64::from(i) * std::f64::consts::FRAC_PI_4;
                            Point3::new(3.0 * a.cos(), 0.25 * f64::from(i), 3.0 * a.sin())
                        })
                        .collect();
                    shape.set_spine(points);
                    shape.set_radius(0.3);
                    shape.set_circle_segments(6);
                    shape.set_z_axis(Vec3::Y);
                }
                Scenario::ScaledTwist => {
                    shape.set_spine((0..5).map(|i| Point3::new(0.0, f64::from(i), 0.0)).collect());
                    shape.set_cross_section(vec![
                        Vec2::new(0.5, 0.0),
                        Vec2::new(0.0, -0.5),
                        Vec2::new(-0.5, 0.0),
                        Vec2::new(0.0, 0.5),
                        Vec2::new(0.5, 0.0),
                    ]);
                    shape.set_scale(vec![[1.0, 1.0], [1.5, 1.0], [2.0, 1.0]]);
                    shape.set_orientation(
                        (0..5)
                            .map(|i| AxisRotation::new(Vec3::Y, f64::from(i) * 0.3))
                            .collect(),
                    );
                }
                Scenario::LongSpineLod => {
                    shape.set_spine((0..=100).map(|i| Point3::new(f64::from(i), 0.0, 0.0)).collect());
                    shape.set_radius(0.2);
                    shape.set_circle_segments(4);
                    shape.set_thresholds(LodThresholds::new(10.0, 50.0));
                    shape.set_color(
                        (0..=100)
                            .map(|i| {
                                let t = f64::from(i) / 100.0;
                                [1.0 - t, t, 0.0]
                            })
                            .collect(),
                    );
                }
            }
            shape
        }
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next().ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
