use pagewright_compiler::{compile, CompileCache};

const PAGE: &str = r#"
import { useState, Card, CardHeader, CardTitle, CardContent, Button } from "@platform";
import { formatMoney } from "@/modules/format";
import ClientRow from "../components/ClientRow";

interface Client {
    id: string;
    name: string;
    balance: number;
}

export default function ClientsPage({ title = "Clients" }: { title?: string }) {
    const [clients, setClients] = useState<Client[]>([]);
    const total = clients.reduce((sum, c) => sum + c.balance, 0);

    return (
        <Card>
            <CardHeader>
                <CardTitle>{title} ({clients.length})</CardTitle>
            </CardHeader>
            <CardContent>
                {clients.map(client => <ClientRow key={client.id} client={client} />)}
                <p>Total: {formatMoney(total)}</p>
                <Button onClick={() => setClients([])}>Clear</Button>
            </CardContent>
        </Card>
    );
}
"#;

#[test]
fn test_compiling_twice_is_identical() {
    let first = compile(PAGE).expect("page compiles");
    let second = compile(PAGE).expect("page compiles");
    assert_eq!(first, second);
    assert_eq!(first.content_hash(), second.content_hash());
}

#[test]
fn test_different_source_different_hash() {
    let a = compile("export const a = 1;").unwrap();
    let b = compile("export const a = 2;").unwrap();
    assert_ne!(a.content_hash(), b.content_hash());
}

#[test]
fn test_syntax_error_has_no_default_export() {
    let broken = PAGE.replace("return (", "return ((");
    let err = compile(&broken).unwrap_err();
    assert!(!err.message.is_empty());
    assert!(err.line > 1);
}

#[test]
fn test_cache_returns_equal_units() {
    let cache = CompileCache::new();
    let direct = compile(PAGE).unwrap();
    let cached = cache.compile(PAGE).unwrap();
    assert_eq!(*cached, direct);
}
