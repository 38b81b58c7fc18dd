use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde::Serialize;

use skybook::app::{App, Landing};
use skybook::config::Config;
use skybook::error::BookingError;
use skybook::model::{Credentials, Registration};
use skybook::notice::{Level, NoticeReceiver};
use skybook::route::{Decision, Route};
use skybook::table;
use skybook::views::flight::parse_passenger;

#[derive(Parser)]
#[command(
    name = "skybook",
    about = "Search, book and manage flights on a SkyBook server",
    version,
    after_help = "\
Examples:
  skybook login -e ana@example.com -p secret
  skybook flights -f JFK -t LAX -d 2026-04-01
  skybook flight 3f2c8a10 --book \"Ana Silva\" --book \"Luis Silva\"
  skybook bookings --show B1
  skybook bookings --cancel B1
  skybook admin locations
  skybook admin add-flight -n AA101 --from JFK --to LAX \\
      --departure 2026-04-01T10:00 --arrival 2026-04-01T13:30 --seats 180 --price 299.99
  skybook notifications --watch"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct GlobalArgs {
    #[arg(long, global = true, value_name = "FILE", help = "Config file [default: ./skybook.toml if present]")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "URL", help = "Base URL of the booking API")]
    api_url: Option<String>,

    #[arg(long, global = true, value_name = "FILE", help = "Where the login session is stored")]
    session_file: Option<PathBuf>,

    #[arg(long, global = true, value_name = "SECS", help = "Request timeout")]
    timeout: Option<u64>,

    #[arg(long, global = true, value_name = "URL", help = "HTTP or SOCKS5 proxy")]
    proxy: Option<String>,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,

    #[arg(long, global = true, help = "Output as pretty-printed JSON")]
    pretty: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(about = "Log in and remember the session")]
    Login(LoginArgs),
    #[command(about = "Create a client account")]
    Register(RegisterArgs),
    #[command(about = "Forget the stored session")]
    Logout,
    #[command(about = "Show who is logged in")]
    Whoami,
    #[command(
        about = "Search available flights",
        after_help = "\
Examples:
  All flights:  skybook flights
  Filtered:     skybook flights -f JFK -t LAX -d 2026-04-01"
    )]
    Flights(FlightsArgs),
    #[command(about = "Show one flight and optionally book it")]
    Flight(FlightArgs),
    #[command(about = "List, inspect and cancel your bookings")]
    Bookings(BookingsArgs),
    #[command(subcommand, about = "Manage locations and flights (admin only)")]
    Admin(AdminCommands),
    #[command(about = "Show your latest notifications")]
    Notifications(NotificationsArgs),
    #[command(about = "Open a route (/, /flight/<id>, /history, /admin, ...) as the web client would")]
    Open {
        #[arg(value_name = "PATH")]
        path: String,
    },
}

#[derive(clap::Args)]
struct LoginArgs {
    #[arg(short, long, value_name = "EMAIL")]
    email: String,
    #[arg(short, long, value_name = "PASSWORD")]
    password: String,
    #[arg(long, value_name = "PATH", help = "Route to continue to after login")]
    return_to: Option<String>,
}

#[derive(clap::Args)]
struct RegisterArgs {
    #[arg(long, value_name = "NAME")]
    first_name: String,
    #[arg(long, value_name = "NAME")]
    last_name: String,
    #[arg(short, long, value_name = "EMAIL")]
    email: String,
    #[arg(short, long, value_name = "PASSWORD")]
    password: String,
}

#[derive(clap::Args)]
struct FlightsArgs {
    #[arg(short, long, value_name = "CITY|IATA", help = "Departure city or airport code")]
    from: Option<String>,
    #[arg(short, long, value_name = "CITY|IATA", help = "Arrival city or airport code")]
    to: Option<String>,
    #[arg(short, long, value_name = "YYYY-MM-DD", help = "Departure date")]
    date: Option<String>,
}

#[derive(clap::Args)]
struct FlightArgs {
    #[arg(value_name = "ID")]
    id: String,
    #[arg(
        long,
        value_name = "\"FIRST LAST\"",
        help = "Book a seat for this passenger (repeatable)",
        num_args = 1
    )]
    book: Vec<String>,
}

#[derive(clap::Args)]
struct BookingsArgs {
    #[arg(long, value_name = "ID", help = "Show one booking with its flight")]
    show: Option<String>,
    #[arg(long, value_name = "ID", help = "Cancel a booking")]
    cancel: Option<String>,
    #[arg(short, long, help = "Do not ask for confirmation")]
    yes: bool,
}

#[derive(clap::Subcommand)]
enum AdminCommands {
    #[command(about = "List locations")]
    Locations,
    #[command(about = "Add a location")]
    AddLocation(LocationArgs),
    #[command(about = "Update a location (unset fields keep their value)")]
    UpdateLocation {
        #[arg(value_name = "ID")]
        id: String,
        #[command(flatten)]
        fields: LocationPatchArgs,
    },
    #[command(about = "Remove a location")]
    DeleteLocation {
        #[arg(value_name = "ID")]
        id: String,
    },
    #[command(about = "Add a flight")]
    AddFlight(AddFlightArgs),
}

#[derive(clap::Args)]
struct LocationArgs {
    #[arg(long, value_name = "NAME", help = "Airport name")]
    name: String,
    #[arg(long, value_name = "IATA")]
    code: String,
    #[arg(long, value_name = "CITY")]
    city: String,
    #[arg(long, value_name = "COUNTRY")]
    country: String,
}

#[derive(clap::Args)]
struct LocationPatchArgs {
    #[arg(long, value_name = "NAME", help = "Airport name")]
    name: Option<String>,
    #[arg(long, value_name = "IATA")]
    code: Option<String>,
    #[arg(long, value_name = "CITY")]
    city: Option<String>,
    #[arg(long, value_name = "COUNTRY")]
    country: Option<String>,
}

#[derive(clap::Args)]
struct AddFlightArgs {
    #[arg(short = 'n', long, value_name = "NUMBER", help = "Flight number, e.g. AA101")]
    number: String,
    #[arg(long, value_name = "IATA", help = "Departure airport code")]
    from: String,
    #[arg(long, value_name = "IATA", help = "Arrival airport code")]
    to: String,
    #[arg(long, value_name = "YYYY-MM-DDTHH:MM")]
    departure: String,
    #[arg(long, value_name = "YYYY-MM-DDTHH:MM")]
    arrival: String,
    #[arg(long, value_name = "N", help = "Total seats (all start available)")]
    seats: u32,
    #[arg(long, value_name = "AMOUNT")]
    price: f64,
}

#[derive(clap::Args)]
struct NotificationsArgs {
    #[arg(long, help = "Keep polling and print every update until Ctrl-C")]
    watch: bool,
}

struct Output {
    json: bool,
    pretty: bool,
}

impl Output {
    fn is_json(&self) -> bool {
        self.json || self.pretty
    }

    fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) {
        if self.is_json() {
            let rendered = if self.pretty {
                serde_json::to_string_pretty(value)
            } else {
                serde_json::to_string(value)
            };
            match rendered {
                Ok(s) => println!("{s}"),
                Err(e) => die(&BookingError::Decode(e.to_string()), self),
            }
        } else {
            println!("{}", text());
        }
    }
}

fn error_code(err: &BookingError) -> i32 {
    match err {
        BookingError::Validation(_)
        | BookingError::InvalidRoute(_)
        | BookingError::Config(_) => 2,
        BookingError::Timeout
        | BookingError::ConnectionFailed(_)
        | BookingError::DnsResolution(_)
        | BookingError::TlsError(_)
        | BookingError::ProxyError(_) => 3,
        BookingError::Unauthorized(_) | BookingError::Forbidden => 4,
        BookingError::NotFound(_) | BookingError::HttpStatus(..) => 5,
        BookingError::Decode(_) => 6,
        BookingError::Storage(_) => 7,
    }
}

fn error_kind(err: &BookingError) -> &'static str {
    match err {
        BookingError::Validation(_) => "validation_error",
        BookingError::InvalidRoute(_) => "invalid_route",
        BookingError::Config(_) => "config_error",
        BookingError::Timeout => "timeout",
        BookingError::ConnectionFailed(_) => "connection_failed",
        BookingError::DnsResolution(_) => "dns_error",
        BookingError::TlsError(_) => "tls_error",
        BookingError::ProxyError(_) => "proxy_error",
        BookingError::Unauthorized(_) => "unauthorized",
        BookingError::Forbidden => "forbidden",
        BookingError::NotFound(_) => "not_found",
        BookingError::HttpStatus(..) => "http_error",
        BookingError::Decode(_) => "decode_error",
        BookingError::Storage(_) => "storage_error",
    }
}

fn die(err: &BookingError, out: &Output) -> ! {
    if out.is_json() {
        let json = serde_json::json!({
            "error": {
                "kind": error_kind(err),
                "message": err.to_string(),
            }
        });
        println!("{json}");
    } else {
        eprintln!("error: {err}");
    }
    process::exit(error_code(err));
}

/// Exit for an error a view already reported through a notice.
fn die_reported(err: &BookingError, out: &Output) -> ! {
    if out.is_json() {
        die(err, out);
    }
    process::exit(error_code(err));
}

fn flush_notices(notices: &mut NoticeReceiver, out: &Output) {
    for notice in notices.drain() {
        if out.is_json() {
            match notice.level {
                Level::Error => {}
                _ => eprintln!("{}", notice.message),
            }
            continue;
        }
        match notice.level {
            Level::Success => println!("✓ {}", notice.message),
            Level::Info => println!("{}", notice.message),
            Level::Error => eprintln!("error: {}", notice.message),
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(global: &GlobalArgs, out: &Output) -> Config {
    let mut config = match Config::load(global.config.as_deref()) {
        Ok(c) => c,
        Err(e) => die(&e, out),
    };
    if let Some(ref url) = global.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(ref path) = global.session_file {
        config.session.path = path.clone();
    }
    if let Some(secs) = global.timeout {
        config.api.timeout = secs;
    }
    if global.proxy.is_some() {
        config.api.proxy = global.proxy.clone();
    }
    if let Err(e) = config.validate() {
        die(&e, out);
    }
    config
}

/// Asks on stderr so `--json` output on stdout stays parseable.
fn prompt_confirm(prompt: &str) -> bool {
    ask(&mut std::io::stdin().lock(), &mut std::io::stderr(), prompt)
}

fn ask(input: &mut impl BufRead, prompt_out: &mut impl Write, prompt: &str) -> bool {
    let _ = write!(prompt_out, "{prompt} [y/N] ");
    let _ = prompt_out.flush();
    let mut line = String::new();
    if input.read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Stops with the guard's redirect when `route` is not reachable.
fn require(app: &App, route: Route, out: &Output) {
    if let Decision::Redirect { to, from } = app.authorize(&route) {
        let message = match (to, from) {
            (Route::Login, Some(from)) => {
                format!("log in first (skybook login), then continue to {from}")
            }
            (to, _) => format!("{route} is not available to your account (redirected to {to})"),
        };
        let err = match app.session().current() {
            None => BookingError::Unauthorized(401),
            Some(_) => BookingError::Validation(message.clone()),
        };
        if out.is_json() {
            die(&err, out);
        }
        eprintln!("error: {message}");
        process::exit(error_code(&err));
    }
}

fn print_landing(app: &App, landing: &Landing, out: &Output) {
    match &landing.route {
        Route::Home => out.print(&app.home.flights(), || {
            if app.home.flights().is_empty() {
                "No flights found.".to_string()
            } else {
                table::render_flights(app.home.flights())
            }
        }),
        Route::Flight(_) => out.print(&app.flight.flight(), || match app.flight.flight() {
            Some(f) => table::render_flight(f),
            None => "Flight not found.".to_string(),
        }),
        Route::History => out.print(&app.history.bookings(), || {
            if app.history.bookings().is_empty() {
                "No bookings yet.".to_string()
            } else {
                table::render_bookings(app.history.bookings())
            }
        }),
        Route::Admin => out.print(&app.admin.locations(), || {
            table::render_locations(app.admin.locations())
        }),
        Route::Login | Route::Register => {
            let value = serde_json::json!({
                "route": landing.route.to_string(),
                "return_to": landing.return_to.as_ref().map(|r| r.to_string()),
            });
            out.print(&value, || match &landing.return_to {
                Some(from) => format!("Please log in to continue to {from} (skybook login)"),
                None => format!("Now at {}", landing.route),
            });
        }
    }
}

async fn navigate(app: &mut App, notices: &mut NoticeReceiver, path: &str, out: &Output) -> Landing {
    let result = app.navigate(path).await;
    flush_notices(notices, out);
    match result {
        Ok(landing) => landing,
        Err(e @ BookingError::InvalidRoute(_)) => die(&e, out),
        Err(e) => die_reported(&e, out),
    }
}

async fn watch_notifications(app: &App, interval: std::time::Duration, out: &Output) {
    let mut poller = app.start_poller(interval);
    let mut feed = poller.subscribe();
    loop {
        tokio::select! {
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
                let list = feed.borrow_and_update().clone();
                out.print(&list, || table::render_notifications(&list));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    poller.cancel();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let out = Output {
        json: cli.global.json,
        pretty: cli.global.pretty,
    };

    let config = load_config(&cli.global, &out);
    let (mut app, mut notices) = match skybook::connect(&config) {
        Ok(pair) => pair,
        Err(e) => die(&e, &out),
    };

    match cli.command {
        Commands::Login(args) => {
            let return_to = match args.return_to.as_deref().map(str::parse::<Route>).transpose() {
                Ok(r) => r,
                Err(e) => die(&e, &out),
            };
            let credentials = Credentials {
                email: args.email,
                password: args.password,
            };
            let result = app.login(&credentials, return_to).await;
            flush_notices(&mut notices, &out);
            match result {
                Ok(next) => {
                    let landing = navigate(&mut app, &mut notices, &next.to_string(), &out).await;
                    print_landing(&app, &landing, &out);
                }
                Err(e) => die_reported(&e, &out),
            }
        }
        Commands::Register(args) => {
            let registration = Registration {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                password: args.password,
            };
            let result = app.register(&registration).await;
            flush_notices(&mut notices, &out);
            if let Err(e) = result {
                die_reported(&e, &out);
            }
        }
        Commands::Logout => {
            if let Err(e) = app.logout() {
                die(&e, &out);
            }
            out.print(&serde_json::json!({ "logged_out": true }), || "Logged out.".to_string());
        }
        Commands::Whoami => {
            let session = app.session().current();
            out.print(&session.as_ref().map(|s| &s.user), || match &session {
                Some(s) => format!("Hello, {} ({}, id {})", s.user.first_name, s.user.role, s.user.id),
                None => "Not logged in.".to_string(),
            });
        }
        Commands::Flights(args) => {
            if let Some(from) = args.from {
                app.home.set_from(from);
            }
            if let Some(to) = args.to {
                app.home.set_to(to);
            }
            if let Some(date) = args.date {
                app.home.set_date(date);
            }
            let landing = navigate(&mut app, &mut notices, "/", &out).await;
            if landing.route != Route::Home && !out.is_json() {
                println!("Redirected to {}", landing.route);
            }
            print_landing(&app, &landing, &out);
        }
        Commands::Flight(args) => {
            let path = Route::Flight(args.id.clone()).to_string();
            let landing = navigate(&mut app, &mut notices, &path, &out).await;

            if !args.book.is_empty() {
                let passengers = match args
                    .book
                    .iter()
                    .map(|raw| parse_passenger(raw))
                    .collect::<Result<Vec<_>, _>>()
                {
                    Ok(p) => p,
                    Err(e) => die(&e, &out),
                };
                let session = app.session().current();
                let result = app.flight.book(session.as_ref(), passengers).await;
                flush_notices(&mut notices, &out);
                match result {
                    Ok(Decision::Redirect { from: Some(from), .. }) => {
                        let err = BookingError::Unauthorized(401);
                        if out.is_json() {
                            die(&err, &out);
                        }
                        eprintln!("error: log in as a client first (skybook login), then continue to {from}");
                        process::exit(error_code(&err));
                    }
                    Ok(_) => {}
                    Err(e) => die_reported(&e, &out),
                }
            }
            print_landing(&app, &landing, &out);
        }
        Commands::Bookings(args) => {
            require(&app, Route::History, &out);
            let landing = navigate(&mut app, &mut notices, "/history", &out).await;

            if let Some(ref id) = args.cancel {
                let mut confirm = |prompt: &str| args.yes || prompt_confirm(prompt);
                let result = app.history.cancel(id, &mut confirm).await;
                flush_notices(&mut notices, &out);
                match result {
                    Ok(false) => println!("Nothing changed."),
                    Ok(true) => {}
                    Err(e) => die_reported(&e, &out),
                }
            }

            if let Some(ref id) = args.show {
                let result = app.history.select(id).await;
                flush_notices(&mut notices, &out);
                if let Err(e) = result {
                    die_reported(&e, &out);
                }
                if let Some(booking) = app.history.selected() {
                    let value = serde_json::json!({
                        "booking": booking,
                        "flight": app.history.flight(),
                    });
                    out.print(&value, || {
                        table::render_booking_detail(booking, app.history.flight())
                    });
                }
                return;
            }

            print_landing(&app, &landing, &out);
        }
        Commands::Admin(command) => {
            require(&app, Route::Admin, &out);
            run_admin(&mut app, &mut notices, command, &out).await;
        }
        Commands::Notifications(args) => {
            let interval = config.poll.interval();
            if args.watch {
                watch_notifications(&app, interval, &out).await;
                return;
            }
            let poller = app.start_poller(interval);
            let mut feed = poller.subscribe();
            let is_client = app
                .session()
                .current()
                .is_some_and(|s| s.role() == skybook::model::Role::Client);
            if is_client {
                let _ = tokio::time::timeout(
                    std::time::Duration::from_secs(config.api.timeout),
                    feed.changed(),
                )
                .await;
            }
            let list = poller.notifications();
            out.print(&list, || table::render_notifications(&list));
        }
        Commands::Open { path } => {
            let landing = navigate(&mut app, &mut notices, &path, &out).await;
            print_landing(&app, &landing, &out);
        }
    }
}

async fn run_admin(app: &mut App, notices: &mut NoticeReceiver, command: AdminCommands, out: &Output) {
    match command {
        AdminCommands::Locations => {
            let landing = navigate(app, notices, "/admin", out).await;
            print_landing(app, &landing, out);
        }
        AdminCommands::AddLocation(args) => {
            let fields = app.admin.location_fields_mut();
            fields.name = args.name;
            fields.airport_code = args.code;
            fields.city = args.city;
            fields.country = args.country;
            let result = app.admin.submit_location().await;
            flush_notices(notices, out);
            match result {
                Ok(()) => out.print(&app.admin.locations(), || {
                    table::render_locations(app.admin.locations())
                }),
                Err(e) => die_reported(&e, out),
            }
        }
        AdminCommands::UpdateLocation { id, fields } => {
            navigate(app, notices, "/admin", out).await;
            let result = app.admin.start_edit(&id);
            flush_notices(notices, out);
            if let Err(e) = result {
                die_reported(&e, out);
            }
            let form = app.admin.location_fields_mut();
            if let Some(name) = fields.name {
                form.name = name;
            }
            if let Some(code) = fields.code {
                form.airport_code = code;
            }
            if let Some(city) = fields.city {
                form.city = city;
            }
            if let Some(country) = fields.country {
                form.country = country;
            }
            let result = app.admin.submit_location().await;
            flush_notices(notices, out);
            match result {
                Ok(()) => out.print(&app.admin.locations(), || {
                    table::render_locations(app.admin.locations())
                }),
                Err(e) => die_reported(&e, out),
            }
        }
        AdminCommands::DeleteLocation { id } => {
            let result = app.admin.delete_location(&id).await;
            flush_notices(notices, out);
            match result {
                Ok(()) => out.print(&app.admin.locations(), || {
                    table::render_locations(app.admin.locations())
                }),
                Err(e) => die_reported(&e, out),
            }
        }
        AdminCommands::AddFlight(args) => {
            let form = app.admin.flight_form_mut();
            form.set_flight_number(args.number);
            form.set_departure_location(args.from.to_uppercase());
            form.set_arrival_location(args.to.to_uppercase());
            form.set_departure_time(args.departure);
            form.set_arrival_time(args.arrival);
            form.set_total_seats(args.seats);
            form.set_price(args.price);
            let result = app.admin.submit_flight().await;
            flush_notices(notices, out);
            if let Err(e) = result {
                die_reported(&e, out);
            }
        }
    }
}
