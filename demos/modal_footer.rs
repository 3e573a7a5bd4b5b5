use std::io;
use std::sync::Arc;

use portal_slots::{
    Logger, MemorySink, PortalSlot, RecordingAudit, RendererSettings, Runtime, RuntimeConfig,
    View, portal_slot,
};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let sink = MemorySink::new();
    let audit = Arc::new(RecordingAudit::new());
    let mut config = RuntimeConfig::default()
        .with_logger(Logger::new(sink.clone()))
        .with_audit(audit.clone());
    config.enable_metrics();
    config.renderer = RendererSettings { pretty: true };

    let footer = portal_slot("modal-footer");
    let mut runtime = Runtime::new(config);
    let mut stdout = io::stdout();

    println!("-- dialog open");
    runtime.render(dialog(&footer, true))?;
    runtime.write_markup(&mut stdout)?;

    println!("-- form dismissed");
    runtime.render(dialog(&footer, false))?;
    runtime.write_markup(&mut stdout)?;

    println!("-- commit stages");
    for stage in audit.stages() {
        println!("{stage:?}");
    }

    println!("-- log");
    for event in sink.events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

fn dialog(footer: &PortalSlot, with_form: bool) -> View {
    let mut body = vec![View::from(View::element("h2").child("Invite teammate"))];
    if with_form {
        body.push(
            View::element("form")
                .child(View::element("input").attr("name", "email"))
                .child(
                    footer.portal.view().children([
                        View::from(View::element("button").attr("type", "reset").child("Cancel")),
                        View::from(View::element("button").attr("type", "submit").child("Invite")),
                    ]),
                )
                .into(),
        );
    }
    body.push(
        View::element("footer")
            .class("dialog-actions")
            .child(footer.slot.view().class("align-end"))
            .into(),
    );
    View::provider([View::from(View::element("section").class("dialog").children(body))])
}
