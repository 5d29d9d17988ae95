//! Example: Basic usage of fos-shadow

use fos_shadow::{Document, Event, ListenerOptions, ShadowRootInit};

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut doc = Document::new();
    let body = doc.body();

    // <x-card> with a named and a default slot
    let card = doc.create_element("x-card");
    doc.append_child(body, card).expect("append card");
    let root = doc
        .attach_shadow(card, ShadowRootInit::open())
        .expect("attach shadow");

    let title_slot = doc.create_element("slot");
    doc.set_attribute(title_slot, "name", "title").expect("name slot");
    let content_slot = doc.create_element("slot");
    doc.append_child(root, title_slot).expect("append slot");
    doc.append_child(root, content_slot).expect("append slot");

    let heading = doc.create_element("h1");
    doc.set_attribute(heading, "slot", "title").expect("slot attribute");
    let text = doc.create_text("Hello from the light tree");
    doc.append_child(card, heading).expect("append heading");
    doc.append_child(card, text).expect("append text");

    doc.add_event_listener(root, "slotchange", ListenerOptions::default(), |event| {
        println!("slotchange at {:?}", event.target());
        Ok(())
    });

    match doc.flush() {
        Ok(rendered) => println!("Rendered {rendered} shadow root(s)"),
        Err(err) => eprintln!("Render failed: {err}"),
    }

    println!("Logical children of card: {:?}", doc.child_nodes(card));
    println!("Composed children of card: {:?}", doc.composed_children(card));

    // A click inside the shadow tree is seen as a click on the card outside it
    doc.add_event_listener(body, "click", ListenerOptions::default(), |event| {
        println!("body saw click on {:?}", event.target());
        Ok(())
    });
    let button = doc.create_element("button");
    doc.append_child(root, button).expect("append button");
    let mut click = Event::bubbling("click");
    if let Err(err) = doc.dispatch_event(button, &mut click) {
        eprintln!("Dispatch failed: {err}");
    }
}
